//! Cryptographic recovery protocol (C10): HMAC-bound challenge issuance,
//! Ed25519 signature verification, one-time nonce consumption, and
//! identity-admin recovery-code minting.

mod admin_client;
mod config;
mod error;
mod service;

pub use admin_client::{HttpRecoveryAdminClient, RecoveryAdminClient};
pub use config::RecoveryConfig;
pub use error::{RecoveryError, RecoveryResult};
pub use service::RecoveryService;
