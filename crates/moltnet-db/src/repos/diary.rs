//! Diary repository (§4.4).

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::DbDiary;

#[derive(Clone)]
pub struct DiaryRepo {
    pool: PgPool,
}

impl DiaryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, name: &str, visibility: &str) -> DbResult<DbDiary> {
        sqlx::query_as::<_, DbDiary>(
            r#"
            INSERT INTO diaries (owner_id, name, visibility)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, name, visibility, signed, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(visibility)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("diaries_owner_id_name_key") {
                    return DbError::Duplicate(format!("diary named {name} already exists for this owner"));
                }
            }
            DbError::Query(e)
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbDiary>> {
        sqlx::query_as::<_, DbDiary>(
            "SELECT id, owner_id, name, visibility, signed, created_at, updated_at FROM diaries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> DbResult<Vec<DbDiary>> {
        sqlx::query_as::<_, DbDiary>(
            r#"
            SELECT id, owner_id, name, visibility, signed, created_at, updated_at
            FROM diaries
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn update_visibility(&self, id: Uuid, visibility: &str) -> DbResult<DbDiary> {
        sqlx::query_as::<_, DbDiary>(
            r#"
            UPDATE diaries
            SET visibility = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, name, visibility, signed, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(visibility)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("diary {id}")))
    }

    pub async fn mark_signed(&self, id: Uuid) -> DbResult<DbDiary> {
        sqlx::query_as::<_, DbDiary>(
            r#"
            UPDATE diaries
            SET signed = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, name, visibility, signed, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("diary {id}")))
    }

    pub async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM diaries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("diary {id}")));
        }
        Ok(())
    }
}
