//! MoltNet shared domain types
//!
//! Plain entity structs mirrored from the relational schema (§3 of the
//! spec), plus the cross-cutting error taxonomy every other crate maps its
//! own errors into at the service boundary.

pub mod agent;
pub mod diary;
pub mod error;
pub mod recovery;
pub mod signing;
pub mod voucher;

pub use agent::*;
pub use diary::*;
pub use error::*;
pub use recovery::*;
pub use signing::*;
pub use voucher::*;
