//! Signing-request state machine types (§3, §4.7 of the spec).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Default time-to-live for a freshly created signing request.
pub const SIGNING_REQUEST_TTL_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SigningStatus {
    Pending,
    Completed,
    Expired,
}

impl SigningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningStatus::Pending => "pending",
            SigningStatus::Completed => "completed",
            SigningStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SigningStatus::Completed | SigningStatus::Expired)
    }
}

impl std::str::FromStr for SigningStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SigningStatus::Pending),
            "completed" => Ok(SigningStatus::Completed),
            "expired" => Ok(SigningStatus::Expired),
            other => Err(format!("unknown signing status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningRequest {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub message: String,
    pub nonce: String,
    pub status: SigningStatus,
    pub signature: Option<String>,
    pub valid: Option<bool>,
    pub workflow_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SigningRequest {
    /// The exact byte string the agent is expected to sign: `message + "." + nonce`.
    pub fn signable_message(&self) -> String {
        format!("{}.{}", self.message, self.nonce)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SigningStatus::Expired || now >= self.expires_at
    }
}
