//! Standalone crypto verification and signing-request DTOs (§4.1, §4.7, §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use moltnet_types::agent::AuthContext;
use moltnet_types::signing::{SigningRequest, SigningStatus};

/// `POST /crypto/verify` request body: standalone Ed25519 verification, no
/// stored signing request involved.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    #[validate(length(min = 1, message = "message must not be empty"))]
    pub message: String,
    #[validate(length(min = 1, message = "signature must not be empty"))]
    pub signature: String,
    #[validate(length(min = 1, message = "public_key must not be empty"))]
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// `GET /crypto/identity`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub identity_id: String,
    pub public_key: String,
    pub fingerprint: String,
}

impl From<&AuthContext> for IdentityResponse {
    fn from(ctx: &AuthContext) -> Self {
        Self {
            identity_id: ctx.identity_id.to_string(),
            public_key: ctx.public_key.clone(),
            fingerprint: ctx.fingerprint.clone(),
        }
    }
}

/// `POST /crypto/signing-requests` request body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSigningRequestRequest {
    #[validate(length(min = 1, message = "message must not be empty"))]
    pub message: String,
}

/// `GET /crypto/signing-requests?status=` query params.
#[derive(Debug, Clone, Deserialize)]
pub struct SigningRequestListQuery {
    pub status: Option<String>,
}

/// `POST /crypto/signing-requests/:id/sign` request body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitSignatureRequest {
    #[validate(length(min = 1, message = "signature must not be empty"))]
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SigningRequestResponse {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub message: String,
    pub nonce: String,
    pub status: SigningStatus,
    pub signature: Option<String>,
    pub valid: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<SigningRequest> for SigningRequestResponse {
    fn from(r: SigningRequest) -> Self {
        Self {
            id: r.id,
            agent_id: r.agent_id,
            message: r.message,
            nonce: r.nonce,
            status: r.status,
            signature: r.signature,
            valid: r.valid,
            created_at: r.created_at,
            expires_at: r.expires_at,
            completed_at: r.completed_at,
        }
    }
}
