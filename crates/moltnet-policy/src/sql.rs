//! Postgres-backed `RelationshipEngine` fallback, used when no external
//! policy engine URL is configured.

use async_trait::async_trait;
use moltnet_db::RelationshipRepo;

use crate::engine::{RelationTuple, RelationshipEngine};
use crate::error::PolicyResult;

pub struct SqlRelationshipEngine {
    repo: RelationshipRepo,
}

impl SqlRelationshipEngine {
    pub fn new(repo: RelationshipRepo) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl RelationshipEngine for SqlRelationshipEngine {
    async fn write(&self, tuple: RelationTuple) -> PolicyResult<()> {
        self.repo
            .write(&tuple.namespace, &tuple.object, &tuple.relation, &tuple.subject)
            .await?;
        Ok(())
    }

    async fn delete(&self, tuple: RelationTuple) -> PolicyResult<()> {
        self.repo
            .delete(&tuple.namespace, &tuple.object, &tuple.relation, &tuple.subject)
            .await?;
        Ok(())
    }

    async fn check(&self, tuple: &RelationTuple) -> PolicyResult<bool> {
        Ok(self
            .repo
            .check(&tuple.namespace, &tuple.object, &tuple.relation, &tuple.subject)
            .await?)
    }

    async fn list_subjects(&self, namespace: &str, object: &str, relation: &str) -> PolicyResult<Vec<String>> {
        let rows = self.repo.list_subjects(namespace, object, relation).await?;
        Ok(rows.into_iter().map(|r| r.subject).collect())
    }
}
