//! RFC 7662 opaque-token introspection client.

use serde::Deserialize;

use crate::config::IntrospectionConfig;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionResult {
    pub active: bool,
    pub sub: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

pub struct IntrospectionClient {
    http: reqwest::Client,
    config: IntrospectionConfig,
}

impl IntrospectionClient {
    pub fn new(config: IntrospectionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn introspect(&self, token: &str) -> AuthResult<IntrospectionResult> {
        let result: IntrospectionResult = self
            .http
            .post(&self.config.introspection_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("token", token)])
            .send()
            .await
            .map_err(|e| AuthError::Upstream(format!("introspection request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::Upstream(format!("introspection response invalid: {e}")))?;

        if !result.active {
            return Err(AuthError::TokenInactive);
        }
        Ok(result)
    }
}
