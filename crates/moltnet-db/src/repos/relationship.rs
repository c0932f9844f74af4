//! Local relationship-tuple fallback store (Design Notes 4.3(b)), used by
//! `SqlRelationshipEngine` when no external policy engine is configured.

use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::DbRelationshipTuple;

#[derive(Clone)]
pub struct RelationshipRepo {
    pool: PgPool,
}

impl RelationshipRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn write(&self, namespace: &str, object: &str, relation: &str, subject: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO relationship_tuples (namespace, object, relation, subject)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (namespace, object, relation, subject) DO NOTHING
            "#,
        )
        .bind(namespace)
        .bind(object)
        .bind(relation)
        .bind(subject)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, namespace: &str, object: &str, relation: &str, subject: &str) -> DbResult<()> {
        sqlx::query(
            "DELETE FROM relationship_tuples WHERE namespace = $1 AND object = $2 AND relation = $3 AND subject = $4",
        )
        .bind(namespace)
        .bind(object)
        .bind(relation)
        .bind(subject)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn check(&self, namespace: &str, object: &str, relation: &str, subject: &str) -> DbResult<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM relationship_tuples
                WHERE namespace = $1 AND object = $2 AND relation = $3 AND subject = $4
            )
            "#,
        )
        .bind(namespace)
        .bind(object)
        .bind(relation)
        .bind(subject)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(row.0)
    }

    pub async fn list_subjects(&self, namespace: &str, object: &str, relation: &str) -> DbResult<Vec<DbRelationshipTuple>> {
        sqlx::query_as::<_, DbRelationshipTuple>(
            r#"
            SELECT id, namespace, object, relation, subject, created_at
            FROM relationship_tuples
            WHERE namespace = $1 AND object = $2 AND relation = $3
            "#,
        )
        .bind(namespace)
        .bind(object)
        .bind(relation)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }
}
