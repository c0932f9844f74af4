//! Request handlers, one module per resource (spec §6).

pub mod agents;
pub mod auth;
pub mod crypto;
pub mod diary;
pub mod health;
pub mod public;
pub mod recovery;
pub mod sharing;

pub use health::*;
