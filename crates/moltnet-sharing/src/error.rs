use thiserror::Error;

use moltnet_types::error::MoltNetError;

#[derive(Debug, Error)]
pub enum SharingError {
    #[error("diary not found: {0}")]
    DiaryNotFound(uuid::Uuid),

    #[error("share not found: {0}")]
    ShareNotFound(uuid::Uuid),

    #[error("target agent not found")]
    TargetNotFound,

    #[error("agent does not have manage access to this diary")]
    ManageForbidden,

    #[error("self share is not allowed")]
    SelfShare,

    #[error("diary is already shared with this agent")]
    AlreadyShared,

    #[error("share is not owned by this agent")]
    NotShareOwner,

    #[error("share is in the wrong status for this transition")]
    WrongStatus,

    #[error("storage error: {0}")]
    Storage(#[from] moltnet_db::DbError),

    #[error("policy engine error: {0}")]
    Policy(#[from] moltnet_policy::PolicyError),
}

pub type SharingResult<T> = Result<T, SharingError>;

impl From<SharingError> for MoltNetError {
    fn from(e: SharingError) -> Self {
        match e {
            SharingError::DiaryNotFound(id) => MoltNetError::NotFound(format!("diary {id}")),
            SharingError::ShareNotFound(id) => MoltNetError::NotFound(format!("share {id}")),
            SharingError::TargetNotFound => MoltNetError::NotFound("agent".to_string()),
            SharingError::ManageForbidden => MoltNetError::Forbidden("cannot manage this diary".to_string()),
            SharingError::SelfShare => MoltNetError::SelfShare,
            SharingError::AlreadyShared => MoltNetError::AlreadyShared,
            SharingError::NotShareOwner => MoltNetError::Forbidden("this share does not belong to you".to_string()),
            SharingError::WrongStatus => MoltNetError::WrongStatus,
            SharingError::Storage(db) => db.into(),
            SharingError::Policy(policy) => MoltNetError::Upstream(policy.to_string()),
        }
    }
}
