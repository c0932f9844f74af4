//! Relationship/permission engine for diary sharing and ownership checks
//! (Design Notes 4.3(b)), built as a trait-plus-impl `PolicyEngine` shape
//! so the backing engine can be swapped without touching callers.

mod engine;
mod error;
mod keto;
mod permissions;
mod sql;

pub use engine::{RelationTuple, RelationshipEngine};
pub use error::{PolicyError, PolicyResult};
pub use keto::KetoClient;
pub use permissions::PermissionAdapter;
pub use sql::SqlRelationshipEngine;
