use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("upstream policy engine error: {0}")]
    Upstream(String),

    #[error("storage error: {0}")]
    Storage(#[from] moltnet_db::DbError),
}

pub type PolicyResult<T> = Result<T, PolicyError>;
