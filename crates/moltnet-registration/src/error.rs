use thiserror::Error;

use moltnet_types::error::MoltNetError;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("voucher validation failed: {0}")]
    VoucherValidationError(String),

    #[error("identity store error: {0}")]
    IdentityStore(String),

    #[error("policy engine error: {0}")]
    Policy(String),

    #[error("OAuth2 client mint error: {0}")]
    OAuthMint(String),

    #[error("storage error: {0}")]
    Storage(#[from] moltnet_db::DbError),

    #[error("workflow error: {0}")]
    Workflow(#[from] moltnet_workflow::WorkflowError),
}

pub type RegistrationResult<T> = Result<T, RegistrationError>;

impl From<RegistrationError> for MoltNetError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::VoucherValidationError(msg) => MoltNetError::Forbidden(msg),
            RegistrationError::IdentityStore(msg)
            | RegistrationError::Policy(msg)
            | RegistrationError::OAuthMint(msg) => MoltNetError::Upstream(msg),
            RegistrationError::Storage(db) => db.into(),
            RegistrationError::Workflow(wf) => MoltNetError::internal(wf.to_string()),
        }
    }
}
