//! MoltNet error taxonomy (§7 of the spec).
//!
//! Every domain crate defines its own `thiserror` enum for the failures it
//! can itself produce; this type is the point where those errors converge
//! into the RFC 9457 `code` vocabulary the HTTP surface speaks. Domain
//! crates implement `From<DomainError> for MoltNetError` so handlers never
//! hand-roll status codes, each variant carrying its own `error_code()`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MoltNetError>;

#[derive(Debug, Clone, Error)]
pub enum MoltNetError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("validation failed")]
    ValidationFields(Vec<FieldError>),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid challenge: {0}")]
    InvalidChallenge(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("signing request already completed")]
    SigningRequestAlreadyCompleted,

    #[error("signing request expired")]
    SigningRequestExpired,

    #[error("self share is not allowed")]
    SelfShare,

    #[error("diary is already shared with this agent")]
    AlreadyShared,

    #[error("share is in the wrong status for this transition")]
    WrongStatus,

    #[error("upstream service error: {0}")]
    Upstream(String),

    #[error("internal error")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl MoltNetError {
    /// The RFC 9457 `code` member and matching HTTP status, per §7.
    pub fn code(&self) -> &'static str {
        match self {
            MoltNetError::Validation(_) | MoltNetError::ValidationFields(_) => "VALIDATION_FAILED",
            MoltNetError::Unauthorized => "UNAUTHORIZED",
            MoltNetError::Forbidden(_) => "FORBIDDEN",
            MoltNetError::NotFound(_) => "NOT_FOUND",
            MoltNetError::InvalidChallenge(_) => "INVALID_CHALLENGE",
            MoltNetError::InvalidSignature => "INVALID_SIGNATURE",
            MoltNetError::SigningRequestExpired => "SIGNING_REQUEST_EXPIRED",
            MoltNetError::SigningRequestAlreadyCompleted => "SIGNING_REQUEST_ALREADY_COMPLETED",
            MoltNetError::SelfShare => "SELF_SHARE",
            MoltNetError::AlreadyShared => "ALREADY_SHARED",
            MoltNetError::WrongStatus => "WRONG_STATUS",
            MoltNetError::Upstream(_) => "UPSTREAM_ERROR",
            MoltNetError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            MoltNetError::Validation(_) | MoltNetError::ValidationFields(_) => 400,
            MoltNetError::Unauthorized => 401,
            MoltNetError::Forbidden(_) => 403,
            MoltNetError::NotFound(_) => 404,
            MoltNetError::InvalidChallenge(_) => 400,
            MoltNetError::InvalidSignature => 400,
            MoltNetError::SigningRequestExpired => 409,
            MoltNetError::SigningRequestAlreadyCompleted => 409,
            MoltNetError::SelfShare => 409,
            MoltNetError::AlreadyShared => 409,
            MoltNetError::WrongStatus => 409,
            MoltNetError::Upstream(_) => 502,
            MoltNetError::Internal(_) => 500,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
