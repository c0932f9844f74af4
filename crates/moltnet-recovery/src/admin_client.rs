//! Identity-store admin API client (spec §4.8 step 7): mints a recovery
//! code for an already-verified agent. Grounded in
//! `moltnet_auth::IntrospectionClient`'s reqwest-plus-typed-response shape.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::RecoveryConfig;
use crate::error::{RecoveryError, RecoveryResult};

#[async_trait]
pub trait RecoveryAdminClient: Send + Sync {
    /// Mint a one-time recovery code for `identity_id`, returning the code
    /// and the public-facing flow URL the agent completes it at.
    async fn mint_recovery_code(&self, identity_id: &str) -> RecoveryResult<(String, String)>;
}

#[derive(Debug, Deserialize)]
struct MintRecoveryCodeResponse {
    recovery_code: String,
    #[serde(default)]
    flow_id: Option<String>,
}

pub struct HttpRecoveryAdminClient {
    http: reqwest::Client,
    config: RecoveryConfig,
}

impl HttpRecoveryAdminClient {
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl RecoveryAdminClient for HttpRecoveryAdminClient {
    async fn mint_recovery_code(&self, identity_id: &str) -> RecoveryResult<(String, String)> {
        let url = format!("{}/recovery/code", self.config.identity_admin_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("X-Ory-Action-Api-Key", &self.config.identity_admin_api_key)
            .json(&json!({ "identity_id": identity_id }))
            .send()
            .await
            .map_err(|e| RecoveryError::Upstream(format!("recovery code mint request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RecoveryError::Upstream(format!(
                "recovery code mint returned status {}",
                response.status()
            )));
        }

        let body: MintRecoveryCodeResponse = response
            .json()
            .await
            .map_err(|e| RecoveryError::Upstream(format!("recovery code mint response invalid: {e}")))?;

        let flow_id = body.flow_id.unwrap_or_else(|| body.recovery_code.clone());
        let flow_url = self.config.recovery_flow_url_template.replace("{flow_id}", &flow_id);
        Ok((body.recovery_code, flow_url))
    }
}
