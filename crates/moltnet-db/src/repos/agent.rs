//! Agent identity repository.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::DbAgent;

#[derive(Clone)]
pub struct AgentRepo {
    pool: PgPool,
}

impl AgentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, public_key: &str, fingerprint: &str) -> DbResult<DbAgent> {
        sqlx::query_as::<_, DbAgent>(
            r#"
            INSERT INTO agents (public_key, fingerprint)
            VALUES ($1, $2)
            RETURNING identity_id, public_key, fingerprint, created_at, updated_at
            "#,
        )
        .bind(public_key)
        .bind(fingerprint)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("agents_public_key_key") {
                    return DbError::Duplicate("public key already registered".to_string());
                }
                if db_err.constraint() == Some("agents_fingerprint_key") {
                    return DbError::Duplicate("fingerprint collision".to_string());
                }
            }
            DbError::Query(e)
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbAgent>> {
        sqlx::query_as::<_, DbAgent>(
            "SELECT identity_id, public_key, fingerprint, created_at, updated_at FROM agents WHERE identity_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn find_by_public_key(&self, public_key: &str) -> DbResult<Option<DbAgent>> {
        sqlx::query_as::<_, DbAgent>(
            "SELECT identity_id, public_key, fingerprint, created_at, updated_at FROM agents WHERE public_key = $1",
        )
        .bind(public_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn find_by_fingerprint(&self, fingerprint: &str) -> DbResult<Option<DbAgent>> {
        sqlx::query_as::<_, DbAgent>(
            "SELECT identity_id, public_key, fingerprint, created_at, updated_at FROM agents WHERE fingerprint = $1",
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn exists(&self, id: Uuid) -> DbResult<bool> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM agents WHERE identity_id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// `findByIdentityId` per spec §4.2 — identity_id is the primary key,
    /// so this is `find_by_id` under the name the spec uses at call sites.
    pub async fn find_by_identity_id(&self, id: Uuid) -> DbResult<Option<DbAgent>> {
        self.find_by_id(id).await
    }

    /// Insert-or-update an agent row by `public_key`, used by the
    /// registration orchestrator's DB-transaction step so a retried step
    /// after a partial failure is idempotent.
    pub async fn upsert(&self, public_key: &str, fingerprint: &str) -> DbResult<DbAgent> {
        sqlx::query_as::<_, DbAgent>(
            r#"
            INSERT INTO agents (public_key, fingerprint)
            VALUES ($1, $2)
            ON CONFLICT (public_key) DO UPDATE SET updated_at = NOW()
            RETURNING identity_id, public_key, fingerprint, created_at, updated_at
            "#,
        )
        .bind(public_key)
        .bind(fingerprint)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    /// Same upsert as `upsert`, against a caller-supplied connection so it
    /// composes into `TransactionRunner::run` alongside a voucher redemption.
    pub async fn upsert_in_tx(&self, conn: &mut PgConnection, public_key: &str, fingerprint: &str) -> DbResult<DbAgent> {
        sqlx::query_as::<_, DbAgent>(
            r#"
            INSERT INTO agents (public_key, fingerprint)
            VALUES ($1, $2)
            ON CONFLICT (public_key) DO UPDATE SET updated_at = NOW()
            RETURNING identity_id, public_key, fingerprint, created_at, updated_at
            "#,
        )
        .bind(public_key)
        .bind(fingerprint)
        .fetch_one(conn)
        .await
        .map_err(DbError::from)
    }

    /// Delete an agent row, used only as registration-rollback
    /// compensation (§4.6) — agents are otherwise immutable once created.
    pub async fn delete(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("DELETE FROM agents WHERE identity_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
