//! JWKS-backed JWT verification with an in-process cache, adapted to
//! verify tokens minted by an external identity provider rather than
//! signing MoltNet's own.

use std::sync::Arc;
use std::time::Instant;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::JwksConfig;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

struct CachedJwks {
    set: JwkSet,
    fetched_at: Instant,
}

/// Fetches and caches a JWKS document, re-fetching once `cache_ttl` has
/// elapsed since the last successful fetch.
pub struct JwksCache {
    http: reqwest::Client,
    config: JwksConfig,
    cached: Arc<RwLock<Option<CachedJwks>>>,
}

impl JwksCache {
    pub fn new(config: JwksConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    async fn current_jwks(&self) -> AuthResult<JwkSet> {
        {
            let guard = self.cached.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.config.cache_ttl {
                    return Ok(cached.set.clone());
                }
            }
        }

        let set: JwkSet = self
            .http
            .get(&self.config.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::Upstream(format!("JWKS fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::Upstream(format!("JWKS response invalid: {e}")))?;

        let mut guard = self.cached.write().await;
        *guard = Some(CachedJwks {
            set: set.clone(),
            fetched_at: Instant::now(),
        });
        Ok(set)
    }

    /// Verify a JWT's signature against the cached JWKS and validate the
    /// standard claims (`exp`, `iss`, `aud`).
    pub async fn verify(&self, token: &str) -> AuthResult<JwtClaims> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let kid = header.kid.ok_or_else(|| AuthError::InvalidToken("token has no kid".to_string()))?;

        let jwks = self.current_jwks().await?;
        let jwk = jwks
            .find(&kid)
            .ok_or_else(|| AuthError::InvalidToken(format!("no JWKS key for kid {kid}")))?;

        let decoding_key = DecodingKey::from_jwk(jwk).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let mut validation = Validation::new(header.alg.clone());
        validation.algorithms = vec![Algorithm::RS256, Algorithm::ES256, Algorithm::EdDSA];
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let data = decode::<JwtClaims>(token, &decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(data.claims)
    }
}
