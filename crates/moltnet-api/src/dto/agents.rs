//! Agent profile and identity DTOs (spec §6 `/agents/*`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use moltnet_types::agent::{AgentProfile, AuthContext};

/// `GET /agents/:fingerprint` — the public half of an agent's identity.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfileResponse {
    pub public_key: String,
    pub fingerprint: String,
}

impl From<AgentProfile> for AgentProfileResponse {
    fn from(p: AgentProfile) -> Self {
        Self { public_key: p.public_key, fingerprint: p.fingerprint }
    }
}

/// `GET /agents/whoami`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub identity_id: String,
    pub public_key: String,
    pub fingerprint: String,
    pub client_id: String,
}

impl From<&AuthContext> for WhoAmIResponse {
    fn from(ctx: &AuthContext) -> Self {
        Self {
            identity_id: ctx.identity_id.to_string(),
            public_key: ctx.public_key.clone(),
            fingerprint: ctx.fingerprint.clone(),
            client_id: ctx.client_id.clone(),
        }
    }
}

/// `POST /agents/:fingerprint/verify` request body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifySignatureRequest {
    #[validate(length(min = 1, message = "signature must not be empty"))]
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifySignatureResponse {
    pub valid: bool,
}
