use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("storage error: {0}")]
    Storage(#[from] moltnet_db::DbError),

    #[error("step {step} failed: {message}")]
    StepFailed { step: String, message: String },

    #[error("workflow step produced a value that does not match the expected shape: {0}")]
    MalformedStepOutput(String),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
