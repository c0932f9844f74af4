//! The `RelationshipEngine` seam (Design Notes 4.3(b)): MoltNet expresses
//! every sharing and ownership permission as a Zanzibar-style relationship
//! tuple `(namespace, object, relation, subject)`, e.g.
//! `("diary", "<diary_id>", "reader", "<agent_id>")`. Two implementations
//! satisfy the same trait so deployments can start on the local Postgres
//! fallback and later point at a real Ory Keto instance without touching
//! callers.

use async_trait::async_trait;

use crate::error::PolicyResult;

/// One relationship tuple: `subject` has `relation` on `object` within
/// `namespace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationTuple {
    pub namespace: String,
    pub object: String,
    pub relation: String,
    pub subject: String,
}

impl RelationTuple {
    pub fn new(
        namespace: impl Into<String>,
        object: impl Into<String>,
        relation: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            object: object.into(),
            relation: relation.into(),
            subject: subject.into(),
        }
    }
}

#[async_trait]
pub trait RelationshipEngine: Send + Sync {
    /// Write a relationship tuple. Idempotent: writing the same tuple
    /// twice is not an error.
    async fn write(&self, tuple: RelationTuple) -> PolicyResult<()>;

    /// Remove a relationship tuple, if present.
    async fn delete(&self, tuple: RelationTuple) -> PolicyResult<()>;

    /// Check whether `subject` has `relation` on `object` in `namespace`.
    async fn check(&self, tuple: &RelationTuple) -> PolicyResult<bool>;

    /// List every subject holding `relation` on `object` in `namespace`.
    async fn list_subjects(&self, namespace: &str, object: &str, relation: &str) -> PolicyResult<Vec<String>>;
}
