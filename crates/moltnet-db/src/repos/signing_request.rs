//! Signing request repository (§4.7).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::DbSigningRequest;

#[derive(Clone)]
pub struct SigningRequestRepo {
    pool: PgPool,
}

impl SigningRequestRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        agent_id: Uuid,
        message: &str,
        nonce: &str,
        expires_at: DateTime<Utc>,
        workflow_id: Option<&str>,
    ) -> DbResult<DbSigningRequest> {
        sqlx::query_as::<_, DbSigningRequest>(
            r#"
            INSERT INTO signing_requests (agent_id, message, nonce, expires_at, workflow_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, agent_id, message, nonce, status, signature, valid, workflow_id,
                      created_at, expires_at, completed_at
            "#,
        )
        .bind(agent_id)
        .bind(message)
        .bind(nonce)
        .bind(expires_at)
        .bind(workflow_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbSigningRequest>> {
        sqlx::query_as::<_, DbSigningRequest>(
            r#"
            SELECT id, agent_id, message, nonce, status, signature, valid, workflow_id,
                   created_at, expires_at, completed_at
            FROM signing_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    /// Complete a pending request with the submitted signature and its
    /// verification result. Only applies while `status = 'pending'` and
    /// unexpired, so a late submission after the sweep expires it loses
    /// the race deterministically.
    pub async fn complete(&self, id: Uuid, signature: &str, valid: bool) -> DbResult<DbSigningRequest> {
        sqlx::query_as::<_, DbSigningRequest>(
            r#"
            UPDATE signing_requests
            SET status = 'completed', signature = $2, valid = $3, completed_at = NOW()
            WHERE id = $1 AND status = 'pending' AND expires_at > NOW()
            RETURNING id, agent_id, message, nonce, status, signature, valid, workflow_id,
                      created_at, expires_at, completed_at
            "#,
        )
        .bind(id)
        .bind(signature)
        .bind(valid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::InvalidInput("signing request is not pending or has expired".to_string()))
    }

    pub async fn set_workflow_id(&self, id: Uuid, workflow_id: &str) -> DbResult<DbSigningRequest> {
        sqlx::query_as::<_, DbSigningRequest>(
            r#"
            UPDATE signing_requests
            SET workflow_id = $2
            WHERE id = $1
            RETURNING id, agent_id, message, nonce, status, signature, valid, workflow_id,
                      created_at, expires_at, completed_at
            "#,
        )
        .bind(id)
        .bind(workflow_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("signing request {id}")))
    }

    /// Public verify path: `findBySignature`, §4.7. Signatures are unique
    /// across completed requests so this is a point lookup.
    pub async fn find_by_signature(&self, signature: &str) -> DbResult<Option<DbSigningRequest>> {
        sqlx::query_as::<_, DbSigningRequest>(
            r#"
            SELECT id, agent_id, message, nonce, status, signature, valid, workflow_id,
                   created_at, expires_at, completed_at
            FROM signing_requests
            WHERE signature = $1
            "#,
        )
        .bind(signature)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn count_by_agent(&self, agent_id: Uuid, status: Option<&str>) -> DbResult<i64> {
        let row: (i64,) = match status {
            Some(status) => {
                sqlx::query_as("SELECT COUNT(*) FROM signing_requests WHERE agent_id = $1 AND status = $2")
                    .bind(agent_id)
                    .bind(status)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM signing_requests WHERE agent_id = $1")
                    .bind(agent_id)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(row.0)
    }

    pub async fn list(
        &self,
        agent_id: Uuid,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<DbSigningRequest>> {
        sqlx::query_as::<_, DbSigningRequest>(
            r#"
            SELECT id, agent_id, message, nonce, status, signature, valid, workflow_id,
                   created_at, expires_at, completed_at
            FROM signing_requests
            WHERE agent_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(agent_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    /// Sweep every expired-but-still-pending request to `expired` and
    /// return the rows that changed, so a caller can fire workflow
    /// compensation signals for each (§4.11 scheduled sweep).
    pub async fn expire_due(&self) -> DbResult<Vec<DbSigningRequest>> {
        sqlx::query_as::<_, DbSigningRequest>(
            r#"
            UPDATE signing_requests
            SET status = 'expired'
            WHERE status = 'pending' AND expires_at <= NOW()
            RETURNING id, agent_id, message, nonce, status, signature, valid, workflow_id,
                      created_at, expires_at, completed_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }
}
