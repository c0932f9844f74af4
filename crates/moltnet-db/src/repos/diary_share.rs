//! Diary share repository (§4.10 sharing lifecycle).

use uuid::Uuid;
use sqlx::PgPool;

use crate::error::{DbError, DbResult};
use crate::models::DbDiaryShare;

#[derive(Clone)]
pub struct DiaryShareRepo {
    pool: PgPool,
}

impl DiaryShareRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn invite(&self, diary_id: Uuid, shared_with: Uuid, role: &str) -> DbResult<DbDiaryShare> {
        sqlx::query_as::<_, DbDiaryShare>(
            r#"
            INSERT INTO diary_shares (diary_id, shared_with, role)
            VALUES ($1, $2, $3)
            RETURNING id, diary_id, shared_with, role, status, invited_at, responded_at
            "#,
        )
        .bind(diary_id)
        .bind(shared_with)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("diary_shares_diary_id_shared_with_key") {
                    return DbError::Duplicate("diary is already shared with this agent".to_string());
                }
            }
            DbError::Query(e)
        })
    }

    pub async fn find_by_diary_and_agent(&self, diary_id: Uuid, shared_with: Uuid) -> DbResult<Option<DbDiaryShare>> {
        sqlx::query_as::<_, DbDiaryShare>(
            r#"
            SELECT id, diary_id, shared_with, role, status, invited_at, responded_at
            FROM diary_shares
            WHERE diary_id = $1 AND shared_with = $2
            "#,
        )
        .bind(diary_id)
        .bind(shared_with)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    /// Re-open a `declined`/`revoked` share as a fresh `pending` invitation
    /// (§4.10 step 4) rather than inserting a second row, since at most one
    /// share row may exist per `(diary_id, shared_with)`.
    pub async fn reopen(&self, id: Uuid, role: &str) -> DbResult<DbDiaryShare> {
        sqlx::query_as::<_, DbDiaryShare>(
            r#"
            UPDATE diary_shares
            SET status = 'pending', role = $2, invited_at = NOW(), responded_at = NULL
            WHERE id = $1
            RETURNING id, diary_id, shared_with, role, status, invited_at, responded_at
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("diary share {id}")))
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbDiaryShare>> {
        sqlx::query_as::<_, DbDiaryShare>(
            "SELECT id, diary_id, shared_with, role, status, invited_at, responded_at FROM diary_shares WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn list_for_diary(&self, diary_id: Uuid) -> DbResult<Vec<DbDiaryShare>> {
        sqlx::query_as::<_, DbDiaryShare>(
            r#"
            SELECT id, diary_id, shared_with, role, status, invited_at, responded_at
            FROM diary_shares
            WHERE diary_id = $1
            ORDER BY invited_at DESC
            "#,
        )
        .bind(diary_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn list_for_agent(&self, agent_id: Uuid, status: Option<&str>) -> DbResult<Vec<DbDiaryShare>> {
        let rows = if let Some(status) = status {
            sqlx::query_as::<_, DbDiaryShare>(
                r#"
                SELECT id, diary_id, shared_with, role, status, invited_at, responded_at
                FROM diary_shares
                WHERE shared_with = $1 AND status = $2
                ORDER BY invited_at DESC
                "#,
            )
            .bind(agent_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, DbDiaryShare>(
                r#"
                SELECT id, diary_id, shared_with, role, status, invited_at, responded_at
                FROM diary_shares
                WHERE shared_with = $1
                ORDER BY invited_at DESC
                "#,
            )
            .bind(agent_id)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }

    /// Transition a share's status, only from the given set of acceptable
    /// current statuses, so accept/decline/revoke can never clobber an
    /// already-terminal share (spec: share status transitions are one-way).
    pub async fn transition(
        &self,
        id: Uuid,
        from_statuses: &[&str],
        to_status: &str,
    ) -> DbResult<DbDiaryShare> {
        sqlx::query_as::<_, DbDiaryShare>(
            r#"
            UPDATE diary_shares
            SET status = $2, responded_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING id, diary_id, shared_with, role, status, invited_at, responded_at
            "#,
        )
        .bind(id)
        .bind(to_status)
        .bind(from_statuses)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::InvalidInput(
            "share is not in an eligible status for this transition".to_string(),
        ))
    }
}
