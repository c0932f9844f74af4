use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("token introspection reported the token as inactive")]
    TokenInactive,

    #[error("upstream identity provider error: {0}")]
    Upstream(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
