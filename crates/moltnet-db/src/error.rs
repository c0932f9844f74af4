//! Database error types.

use moltnet_types::error::MoltNetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::Serialization(e.to_string())
    }
}

impl From<DbError> for MoltNetError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => MoltNetError::NotFound(msg),
            DbError::Duplicate(msg) | DbError::Constraint(msg) | DbError::CapacityExceeded(msg) => {
                MoltNetError::Validation(msg)
            }
            DbError::InvalidInput(msg) => MoltNetError::Validation(msg),
            other => MoltNetError::internal(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
