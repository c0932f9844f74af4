//! Dispatches a bearer token to JWKS verification or introspection based
//! on its shape: a three-segment dotted string is treated as a JWT, an
//! `ory_at_`/`ory_ht_`-prefixed opaque string is sent to introspection.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::introspection::IntrospectionClient;
use crate::jwks::JwksCache;

/// The subset of a verified token's claims MoltNet needs to build an
/// `AuthContext`. The caller (the API surface) still looks up the
/// matching `Agent` row to fill in `public_key`/`fingerprint`.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    pub identity_id: Uuid,
    pub client_id: String,
    pub scopes: HashSet<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

const OPAQUE_TOKEN_PREFIXES: &[&str] = &["ory_at_", "ory_ht_"];

pub struct TokenValidator {
    jwks: Option<JwksCache>,
    introspection: Option<IntrospectionClient>,
}

impl TokenValidator {
    pub fn new(config: AuthConfig) -> Self {
        let jwks = (!config.jwks.jwks_url.is_empty()).then(|| JwksCache::new(config.jwks.clone()));
        let introspection =
            (!config.introspection.introspection_url.is_empty()).then(|| IntrospectionClient::new(config.introspection));
        Self { jwks, introspection }
    }

    pub async fn validate(&self, token: &str) -> AuthResult<ValidatedToken> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        if is_opaque_token(token) {
            return self.introspect(token).await;
        }

        if looks_like_jwt(token) {
            if let Some(cache) = self.jwks.as_ref() {
                match cache.verify(token).await {
                    Ok(claims) if claims.exp < Utc::now().timestamp() => return Err(AuthError::TokenExpired),
                    Ok(claims) => {
                        return Ok(ValidatedToken {
                            identity_id: parse_identity(&claims.sub)?,
                            client_id: claims.client_id.unwrap_or_default(),
                            scopes: parse_scopes(claims.scope.as_deref()),
                            expires_at: DateTime::from_timestamp(claims.exp, 0),
                        });
                    }
                    // §4.4: a JWT that fails local verification falls through
                    // to introspection rather than failing outright, so a
                    // token revoked server-side (but whose signature still
                    // checks out against a stale cached JWKS entry) is still
                    // rejected, and one invalidated for other reasons gets a
                    // second, authoritative opinion.
                    Err(_) => return self.introspect(token).await,
                }
            }
            return self.introspect(token).await;
        }

        // §4.4: anything that is neither opaque-prefixed nor JWT-shaped
        // still goes to introspection rather than failing outright.
        self.introspect(token).await
    }

    async fn introspect(&self, token: &str) -> AuthResult<ValidatedToken> {
        let client = self
            .introspection
            .as_ref()
            .ok_or_else(|| AuthError::InvalidToken("opaque tokens are not accepted by this deployment".to_string()))?;
        let result = client.introspect(token).await?;
        let sub = result.sub.ok_or_else(|| AuthError::InvalidToken("introspection result missing sub".to_string()))?;
        Ok(ValidatedToken {
            identity_id: parse_identity(&sub)?,
            client_id: result.client_id.unwrap_or_default(),
            scopes: parse_scopes(result.scope.as_deref()),
            expires_at: result.exp.and_then(|e| DateTime::from_timestamp(e, 0)),
        })
    }
}

fn is_opaque_token(token: &str) -> bool {
    OPAQUE_TOKEN_PREFIXES.iter().any(|p| token.starts_with(p))
}

fn looks_like_jwt(token: &str) -> bool {
    token.split('.').count() == 3
}

fn parse_identity(sub: &str) -> AuthResult<Uuid> {
    Uuid::parse_str(sub).map_err(|_| AuthError::InvalidToken(format!("sub claim {sub} is not a UUID")))
}

fn parse_scopes(scope: Option<&str>) -> HashSet<String> {
    scope
        .unwrap_or_default()
        .split_whitespace()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_opaque_tokens() {
        assert!(is_opaque_token("ory_at_abc123"));
        assert!(is_opaque_token("ory_ht_xyz"));
        assert!(!is_opaque_token("eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiIxIn0.sig"));
    }

    #[test]
    fn recognizes_jwt_shape() {
        assert!(looks_like_jwt("header.payload.signature"));
        assert!(!looks_like_jwt("ory_at_abc123"));
    }

    #[test]
    fn parses_space_separated_scopes() {
        let scopes = parse_scopes(Some("diary:read diary:write"));
        assert!(scopes.contains("diary:read"));
        assert!(scopes.contains("diary:write"));
        assert_eq!(scopes.len(), 2);
    }
}
