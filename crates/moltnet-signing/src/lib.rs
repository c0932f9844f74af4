//! Signing orchestrator (C9): nonce-bound signing-request state machine.

mod error;
mod service;

pub use error::{SigningError, SigningResult};
pub use service::{SigningService, WORKFLOW_KIND};
