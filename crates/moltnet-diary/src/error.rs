use thiserror::Error;

use moltnet_types::error::MoltNetError;

#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("diary not found: {0}")]
    DiaryNotFound(uuid::Uuid),

    #[error("diary entry not found: {0}")]
    EntryNotFound(uuid::Uuid),

    #[error("agent does not have write access to this diary")]
    WriteForbidden,

    #[error("agent does not have read access to this diary")]
    ReadForbidden,

    #[error("agent does not have manage access to this diary")]
    ManageForbidden,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] moltnet_db::DbError),

    #[error("policy engine error: {0}")]
    Policy(#[from] moltnet_policy::PolicyError),

    #[error("workflow error: {0}")]
    Workflow(#[from] moltnet_workflow::WorkflowError),
}

pub type DiaryResult<T> = Result<T, DiaryError>;

impl From<DiaryError> for MoltNetError {
    fn from(e: DiaryError) -> Self {
        match e {
            DiaryError::DiaryNotFound(id) => MoltNetError::NotFound(format!("diary {id}")),
            DiaryError::EntryNotFound(id) => MoltNetError::NotFound(format!("diary entry {id}")),
            DiaryError::WriteForbidden => MoltNetError::Forbidden("cannot write to this diary".to_string()),
            DiaryError::ReadForbidden => MoltNetError::Forbidden("cannot read this diary".to_string()),
            DiaryError::ManageForbidden => MoltNetError::Forbidden("cannot manage this diary".to_string()),
            DiaryError::Validation(msg) => MoltNetError::Validation(msg),
            DiaryError::Storage(db) => db.into(),
            DiaryError::Policy(policy) => MoltNetError::Upstream(policy.to_string()),
            DiaryError::Workflow(wf) => MoltNetError::internal(wf.to_string()),
        }
    }
}
