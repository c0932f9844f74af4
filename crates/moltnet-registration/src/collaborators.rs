//! The two external collaborators the registration orchestrator composes
//! (spec §4.6 steps 2 and 5): an OIDC-style identity store and an OAuth2
//! authorization server's client-credentials admin API. Both are narrow
//! traits so tests substitute in-memory fakes; the HTTP implementations
//! mirror `moltnet_recovery::HttpRecoveryAdminClient`'s reqwest shape.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{RegistrationError, RegistrationResult};

#[derive(Debug, Clone, Serialize)]
pub struct IdentityTraits {
    pub public_key: String,
    pub voucher_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIdentity {
    pub identity_id: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an identity with a random placeholder password and the
    /// given traits (spec §4.6 step 2).
    async fn create_identity(&self, traits: IdentityTraits) -> RegistrationResult<CreatedIdentity>;

    /// Best-effort rollback: delete an identity created moments ago.
    /// Failures here are logged by the caller, never propagated, since
    /// the original registration error must still win (spec §4.6).
    async fn delete_identity(&self, identity_id: &str) -> RegistrationResult<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct OAuthClientMetadata {
    pub identity_id: String,
    pub public_key: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MintedOAuthClient {
    pub client_id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait OAuthClientMinter: Send + Sync {
    /// Mint a `client_credentials`-scoped OAuth2 client carrying
    /// `metadata` (spec §4.6 step 5).
    async fn mint_client(&self, metadata: OAuthClientMetadata) -> RegistrationResult<MintedOAuthClient>;
}

/// Reqwest-backed `IdentityProvider` against an Ory Kratos-compatible
/// admin API.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    admin_url: String,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(admin_url: String, api_key: String) -> Self {
        Self { http: reqwest::Client::new(), admin_url, api_key }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn create_identity(&self, traits: IdentityTraits) -> RegistrationResult<CreatedIdentity> {
        let placeholder_password = random_placeholder_password();
        let url = format!("{}/identities", self.admin_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("X-Ory-Action-Api-Key", &self.api_key)
            .json(&json!({
                "schema_id": "agent",
                "traits": { "public_key": traits.public_key, "voucher_code": traits.voucher_code },
                "credentials": { "password": { "config": { "password": placeholder_password } } },
            }))
            .send()
            .await
            .map_err(|e| RegistrationError::IdentityStore(format!("create identity failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RegistrationError::IdentityStore(format!(
                "create identity returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RegistrationError::IdentityStore(format!("create identity response invalid: {e}")))
    }

    async fn delete_identity(&self, identity_id: &str) -> RegistrationResult<()> {
        let url = format!("{}/identities/{identity_id}", self.admin_url.trim_end_matches('/'));
        self.http
            .delete(&url)
            .header("X-Ory-Action-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| RegistrationError::IdentityStore(format!("delete identity failed: {e}")))?;
        Ok(())
    }
}

/// Reqwest-backed `OAuthClientMinter` against an Ory Hydra-compatible
/// admin API.
pub struct HttpOAuthClientMinter {
    http: reqwest::Client,
    admin_url: String,
    api_key: String,
}

impl HttpOAuthClientMinter {
    pub fn new(admin_url: String, api_key: String) -> Self {
        Self { http: reqwest::Client::new(), admin_url, api_key }
    }
}

#[async_trait]
impl OAuthClientMinter for HttpOAuthClientMinter {
    async fn mint_client(&self, metadata: OAuthClientMetadata) -> RegistrationResult<MintedOAuthClient> {
        let mut meta: HashMap<&str, String> = HashMap::new();
        meta.insert("identity_id", metadata.identity_id);
        meta.insert("public_key", metadata.public_key);
        meta.insert("fingerprint", metadata.fingerprint);

        let url = format!("{}/clients", self.admin_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("X-Ory-Action-Api-Key", &self.api_key)
            .json(&json!({
                "grant_types": ["client_credentials"],
                "metadata": meta,
            }))
            .send()
            .await
            .map_err(|e| RegistrationError::OAuthMint(format!("client mint failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RegistrationError::OAuthMint(format!(
                "client mint returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RegistrationError::OAuthMint(format!("client mint response invalid: {e}")))
    }
}

fn random_placeholder_password() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 24];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
