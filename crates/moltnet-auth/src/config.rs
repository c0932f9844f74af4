//! Bearer-token validation configuration: env-overridable defaults
//! layered the way the rest of MoltNet's domain configs are.
//!
//! MoltNet never mints its own tokens (§4.6, §6): agents authenticate with
//! bearer tokens issued by an external identity provider, either opaque
//! tokens verified by introspection or JWTs verified against a JWKS
//! endpoint. `TOKEN_VALIDATION_MODE` selects which.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwks: JwksConfig,
    pub introspection: IntrospectionConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwks: JwksConfig::default(),
            introspection: IntrospectionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksConfig {
    /// JWKS endpoint URL of the external identity provider.
    pub jwks_url: String,
    /// Expected `iss` claim.
    pub issuer: String,
    /// Expected `aud` claim.
    pub audience: String,
    /// How long a fetched JWKS document is trusted before refetching.
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,
}

impl Default for JwksConfig {
    fn default() -> Self {
        Self {
            jwks_url: String::new(),
            issuer: String::new(),
            audience: "moltnet".to_string(),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionConfig {
    /// RFC 7662 token introspection endpoint.
    pub introspection_url: String,
    /// Client credentials used to authenticate to the introspection endpoint.
    pub client_id: String,
    pub client_secret: String,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            introspection_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("JWKS_URL") {
            config.jwks.jwks_url = url;
        }
        if let Ok(issuer) = std::env::var("OIDC_ISSUER") {
            config.jwks.issuer = issuer;
        }
        if let Ok(audience) = std::env::var("OIDC_AUDIENCE") {
            config.jwks.audience = audience;
        }
        if let Ok(url) = std::env::var("INTROSPECTION_URL") {
            config.introspection.introspection_url = url;
        }
        if let Ok(client_id) = std::env::var("INTROSPECTION_CLIENT_ID") {
            config.introspection.client_id = client_id;
        }
        if let Ok(client_secret) = std::env::var("INTROSPECTION_CLIENT_SECRET") {
            config.introspection.client_secret = client_secret;
        }
        config
    }

    /// At least one validation path must be configured.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.jwks.jwks_url.is_empty() && self.introspection.introspection_url.is_empty() {
            errors.push("either JWKS_URL or INTROSPECTION_URL must be set".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
