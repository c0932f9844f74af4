use thiserror::Error;

use moltnet_types::error::MoltNetError;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("agent not found")]
    AgentNotFound,

    #[error("signing request not found")]
    NotFound,

    #[error("signing request expired")]
    Expired,

    #[error("signing request already completed")]
    AlreadyCompleted,

    #[error("storage error: {0}")]
    Storage(#[from] moltnet_db::DbError),

    #[error("workflow error: {0}")]
    Workflow(#[from] moltnet_workflow::WorkflowError),
}

pub type SigningResult<T> = Result<T, SigningError>;

impl From<SigningError> for MoltNetError {
    fn from(e: SigningError) -> Self {
        match e {
            SigningError::AgentNotFound | SigningError::NotFound => MoltNetError::NotFound(e.to_string()),
            SigningError::Expired => MoltNetError::SigningRequestExpired,
            SigningError::AlreadyCompleted => MoltNetError::SigningRequestAlreadyCompleted,
            SigningError::Storage(db) => db.into(),
            SigningError::Workflow(wf) => MoltNetError::internal(wf.to_string()),
        }
    }
}
