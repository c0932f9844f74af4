use thiserror::Error;

use moltnet_types::error::MoltNetError;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("agent not found")]
    AgentNotFound,

    #[error("invalid challenge: {0}")]
    InvalidChallenge(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("upstream identity-admin error: {0}")]
    Upstream(String),

    #[error("storage error: {0}")]
    Storage(#[from] moltnet_db::DbError),
}

pub type RecoveryResult<T> = Result<T, RecoveryError>;

impl From<RecoveryError> for MoltNetError {
    fn from(e: RecoveryError) -> Self {
        match e {
            RecoveryError::AgentNotFound => MoltNetError::NotFound(e.to_string()),
            RecoveryError::InvalidChallenge(msg) => MoltNetError::InvalidChallenge(msg),
            RecoveryError::InvalidSignature => MoltNetError::InvalidSignature,
            RecoveryError::Upstream(msg) => MoltNetError::Upstream(msg),
            RecoveryError::Storage(db) => db.into(),
        }
    }
}
