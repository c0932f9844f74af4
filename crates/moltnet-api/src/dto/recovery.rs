//! Identity recovery protocol DTOs (§4.8, §6 `/recovery/*`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use moltnet_types::recovery::{RecoveryChallenge, RecoveryResult};

/// `POST /recovery/challenge` request body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChallengeRequest {
    #[validate(length(min = 1, message = "public_key must not be empty"))]
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChallengeResponse {
    pub challenge: String,
    pub hmac: String,
}

impl From<RecoveryChallenge> for ChallengeResponse {
    fn from(c: RecoveryChallenge) -> Self {
        Self { challenge: c.challenge, hmac: c.hmac }
    }
}

/// `POST /recovery/verify` request body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    #[validate(length(min = 1, message = "challenge must not be empty"))]
    pub challenge: String,
    #[validate(length(min = 1, message = "hmac must not be empty"))]
    pub hmac: String,
    #[validate(length(min = 1, message = "signature must not be empty"))]
    pub signature: String,
    #[validate(length(min = 1, message = "public_key must not be empty"))]
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub recovery_code: String,
    pub recovery_flow_url: String,
}

impl From<RecoveryResult> for VerifyResponse {
    fn from(r: RecoveryResult) -> Self {
        Self { recovery_code: r.recovery_code, recovery_flow_url: r.recovery_flow_url }
    }
}
