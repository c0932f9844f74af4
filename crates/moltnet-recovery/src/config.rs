//! Recovery protocol configuration, grounded in `moltnet_auth::AuthConfig`'s
//! layered-struct-with-Default shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// HMAC key binding challenge issuance to verification. Must be at
    /// least 16 bytes (spec §6 environment: `RECOVERY_CHALLENGE_SECRET`).
    pub challenge_secret: Vec<u8>,
    /// Identity-store admin API used to mint a recovery code once the
    /// challenge is verified (spec §4.8 step 7).
    pub identity_admin_url: String,
    pub identity_admin_api_key: String,
    /// Public-facing recovery flow URL template; `{flow_id}` is
    /// substituted with the minted flow's id.
    pub recovery_flow_url_template: String,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            challenge_secret: Vec::new(),
            identity_admin_url: String::new(),
            identity_admin_api_key: String::new(),
            recovery_flow_url_template: "https://id.moltnet.org/recovery/{flow_id}".to_string(),
        }
    }
}

impl RecoveryConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(secret) = std::env::var("RECOVERY_CHALLENGE_SECRET") {
            config.challenge_secret = secret.into_bytes();
        }
        if let Ok(url) = std::env::var("IDENTITY_ADMIN_URL") {
            config.identity_admin_url = url;
        }
        if let Ok(key) = std::env::var("ORY_ACTION_API_KEY") {
            config.identity_admin_api_key = key;
        }
        config
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.challenge_secret.len() < 16 {
            errors.push("RECOVERY_CHALLENGE_SECRET must be at least 16 bytes".to_string());
        }
        if self.identity_admin_url.is_empty() {
            errors.push("IDENTITY_ADMIN_URL must be set".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
