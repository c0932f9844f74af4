//! Crypto error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
