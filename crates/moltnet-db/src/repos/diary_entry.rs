//! Diary entry repository: CRUD plus hybrid vector+lexical search (§4.9).

use chrono::Utc;
use pgvector::Vector;
use sqlx::PgPool;
use uuid::Uuid;

use moltnet_types::diary::RankWeights;

use crate::error::{DbError, DbResult};
use crate::models::{DbDiaryEntry, DbScoredDiaryEntry};

#[derive(Clone)]
pub struct DiaryEntryRepo {
    pool: PgPool,
}

/// Inputs to a single hybrid-search call.
pub struct HybridSearchParams<'a> {
    pub diary_ids: &'a [Uuid],
    pub query_text: &'a str,
    pub query_embedding: Option<&'a [f32]>,
    pub weights: RankWeights,
    pub limit: i64,
}

impl DiaryEntryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        diary_id: Uuid,
        title: Option<&str>,
        content: &str,
        embedding: Option<&[f32]>,
        tags: Option<&[String]>,
        injection_risk: &str,
        importance: i16,
        entry_type: &str,
    ) -> DbResult<DbDiaryEntry> {
        sqlx::query_as::<_, DbDiaryEntry>(
            r#"
            INSERT INTO diary_entries
                (diary_id, title, content, embedding, tags, injection_risk, importance, entry_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, diary_id, title, content, embedding, tags, injection_risk, importance,
                      access_count, last_accessed_at, entry_type, superseded_by, created_at, updated_at
            "#,
        )
        .bind(diary_id)
        .bind(title)
        .bind(content)
        .bind(embedding.map(|e| Vector::from(e.to_vec())))
        .bind(tags)
        .bind(injection_risk)
        .bind(importance)
        .bind(entry_type)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbDiaryEntry>> {
        sqlx::query_as::<_, DbDiaryEntry>(
            r#"
            SELECT id, diary_id, title, content, embedding, tags, injection_risk, importance,
                   access_count, last_accessed_at, entry_type, superseded_by, created_at, updated_at
            FROM diary_entries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    pub async fn list_by_diary(&self, diary_id: Uuid, limit: i64, offset: i64) -> DbResult<Vec<DbDiaryEntry>> {
        sqlx::query_as::<_, DbDiaryEntry>(
            r#"
            SELECT id, diary_id, title, content, embedding, tags, injection_risk, importance,
                   access_count, last_accessed_at, entry_type, superseded_by, created_at, updated_at
            FROM diary_entries
            WHERE diary_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(diary_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }

    /// Supersede an entry with a newer revision, linking the old row
    /// forward rather than deleting it (spec: superseded entries remain
    /// readable but are excluded from search by default).
    pub async fn supersede(&self, old_id: Uuid, new_id: Uuid) -> DbResult<()> {
        let result = sqlx::query("UPDATE diary_entries SET superseded_by = $2, updated_at = NOW() WHERE id = $1")
            .bind(old_id)
            .bind(new_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("diary entry {old_id}")));
        }
        Ok(())
    }

    pub async fn touch_access(&self, id: Uuid) -> DbResult<()> {
        sqlx::query(
            "UPDATE diary_entries SET access_count = access_count + 1, last_accessed_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM diary_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("diary entry {id}")));
        }
        Ok(())
    }

    /// Hybrid search blending vector cosine similarity, lexical full-text
    /// rank, recency, and stored importance into one weighted score
    /// (§4.9). Superseded entries are excluded. When no embedding is
    /// available (embedding pipeline down, or a keyword-only query),
    /// relevance degrades to lexical rank alone.
    pub async fn hybrid_search(&self, params: HybridSearchParams<'_>) -> DbResult<Vec<DbScoredDiaryEntry>> {
        let now = Utc::now();
        let weights = params.weights;

        let rows = match params.query_embedding {
            Some(embedding) => {
                let vector = Vector::from(embedding.to_vec());
                // Relevance averages vector cosine similarity with a
                // lexical rank normalized into [0,1) via rank/(rank+1)
                // (§4.2: "the two are averaged"), scaled by the caller's
                // overall `relevance` weight alongside recency/importance.
                sqlx::query_as::<_, DbScoredDiaryEntry>(
                    r#"
                    SELECT
                        id, diary_id, title, content, embedding, tags, injection_risk, importance,
                        access_count, last_accessed_at, entry_type, superseded_by, created_at, updated_at,
                        ($4 * (0.5 * (1 - (embedding <=> $2))
                               + 0.5 * (ts_rank_cd(to_tsvector('english', coalesce(title, '') || ' ' || content),
                                                   plainto_tsquery('english', $3))
                                        / (ts_rank_cd(to_tsvector('english', coalesce(title, '') || ' ' || content),
                                                      plainto_tsquery('english', $3)) + 1)))
                         + $5 * EXP(-1 * EXTRACT(EPOCH FROM ($6 - created_at)) / 86400.0 / 30.0)
                         + $7 * (importance::float8 / 10.0)
                        ) AS score
                    FROM diary_entries
                    WHERE diary_id = ANY($1)
                      AND superseded_by IS NULL
                      AND embedding IS NOT NULL
                    ORDER BY score DESC
                    LIMIT $8
                    "#,
                )
                .bind(params.diary_ids)
                .bind(vector)
                .bind(params.query_text)
                .bind(weights.relevance)
                .bind(weights.recency)
                .bind(now)
                .bind(weights.importance)
                .bind(params.limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DbScoredDiaryEntry>(
                    r#"
                    SELECT
                        id, diary_id, title, content, embedding, tags, injection_risk, importance,
                        access_count, last_accessed_at, entry_type, superseded_by, created_at, updated_at,
                        ($3 * (ts_rank_cd(to_tsvector('english', coalesce(title, '') || ' ' || content),
                                          plainto_tsquery('english', $2))
                               / (ts_rank_cd(to_tsvector('english', coalesce(title, '') || ' ' || content),
                                             plainto_tsquery('english', $2)) + 1))
                         + $4 * EXP(-1 * EXTRACT(EPOCH FROM ($5 - created_at)) / 86400.0 / 30.0)
                         + $6 * (importance::float8 / 10.0)
                        ) AS score
                    FROM diary_entries
                    WHERE diary_id = ANY($1)
                      AND superseded_by IS NULL
                    ORDER BY score DESC
                    LIMIT $7
                    "#,
                )
                .bind(params.diary_ids)
                .bind(params.query_text)
                .bind(weights.relevance)
                .bind(weights.recency)
                .bind(now)
                .bind(weights.importance)
                .bind(params.limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    /// Paginated public feed (§4.2, §6 `GET /public/feed`): entries whose
    /// parent diary is `visibility = 'public'`, newest-first with a
    /// `(created_at, id)` keyset cursor, optionally narrowed to entries
    /// carrying a given tag. Superseded entries are excluded — the feed
    /// only ever shows the current revision of a memory.
    pub async fn list_public_feed(
        &self,
        before: Option<(chrono::DateTime<Utc>, Uuid)>,
        tag: Option<&str>,
        limit: i64,
    ) -> DbResult<Vec<DbDiaryEntry>> {
        let rows = sqlx::query_as::<_, DbDiaryEntry>(
            r#"
            SELECT e.id, e.diary_id, e.title, e.content, e.embedding, e.tags, e.injection_risk,
                   e.importance, e.access_count, e.last_accessed_at, e.entry_type, e.superseded_by,
                   e.created_at, e.updated_at
            FROM diary_entries e
            JOIN diaries d ON d.id = e.diary_id
            WHERE d.visibility = 'public'
              AND e.superseded_by IS NULL
              AND ($1::timestamptz IS NULL OR (e.created_at, e.id) < ($1, $2))
              AND ($3::text IS NULL OR $3 = ANY(e.tags))
            ORDER BY e.created_at DESC, e.id DESC
            LIMIT $4
            "#,
        )
        .bind(before.map(|(created_at, _)| created_at))
        .bind(before.map(|(_, id)| id))
        .bind(tag)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(rows)
    }

    /// Hybrid search restricted to public entries (§6 `GET
    /// /public/feed/search`), scoped across every owner's public diaries
    /// rather than a single caller's diary set.
    pub async fn search_public(
        &self,
        query_text: &str,
        query_embedding: Option<&[f32]>,
        tag: Option<&str>,
        weights: RankWeights,
        limit: i64,
    ) -> DbResult<Vec<DbScoredDiaryEntry>> {
        let now = Utc::now();

        let rows = match query_embedding {
            Some(embedding) => {
                let vector = Vector::from(embedding.to_vec());
                sqlx::query_as::<_, DbScoredDiaryEntry>(
                    r#"
                    SELECT
                        e.id, e.diary_id, e.title, e.content, e.embedding, e.tags, e.injection_risk,
                        e.importance, e.access_count, e.last_accessed_at, e.entry_type, e.superseded_by,
                        e.created_at, e.updated_at,
                        ($2 * (0.5 * (1 - (e.embedding <=> $1))
                               + 0.5 * (ts_rank_cd(to_tsvector('english', coalesce(e.title, '') || ' ' || e.content),
                                                   plainto_tsquery('english', $3))
                                        / (ts_rank_cd(to_tsvector('english', coalesce(e.title, '') || ' ' || e.content),
                                                      plainto_tsquery('english', $3)) + 1)))
                         + $4 * EXP(-1 * EXTRACT(EPOCH FROM ($5 - e.created_at)) / 86400.0 / 30.0)
                         + $6 * (e.importance::float8 / 10.0)
                        ) AS score
                    FROM diary_entries e
                    JOIN diaries d ON d.id = e.diary_id
                    WHERE d.visibility = 'public'
                      AND e.superseded_by IS NULL
                      AND e.embedding IS NOT NULL
                      AND ($8::text IS NULL OR $8 = ANY(e.tags))
                    ORDER BY score DESC
                    LIMIT $7
                    "#,
                )
                .bind(vector)
                .bind(weights.relevance)
                .bind(query_text)
                .bind(weights.recency)
                .bind(now)
                .bind(weights.importance)
                .bind(limit)
                .bind(tag)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, DbScoredDiaryEntry>(
                    r#"
                    SELECT
                        e.id, e.diary_id, e.title, e.content, e.embedding, e.tags, e.injection_risk,
                        e.importance, e.access_count, e.last_accessed_at, e.entry_type, e.superseded_by,
                        e.created_at, e.updated_at,
                        ($2 * (ts_rank_cd(to_tsvector('english', coalesce(e.title, '') || ' ' || e.content),
                                          plainto_tsquery('english', $1))
                               / (ts_rank_cd(to_tsvector('english', coalesce(e.title, '') || ' ' || e.content),
                                             plainto_tsquery('english', $1)) + 1))
                         + $3 * EXP(-1 * EXTRACT(EPOCH FROM ($4 - e.created_at)) / 86400.0 / 30.0)
                         + $5 * (e.importance::float8 / 10.0)
                        ) AS score
                    FROM diary_entries e
                    JOIN diaries d ON d.id = e.diary_id
                    WHERE d.visibility = 'public'
                      AND e.superseded_by IS NULL
                      AND ($7::text IS NULL OR $7 = ANY(e.tags))
                    ORDER BY score DESC
                    LIMIT $6
                    "#,
                )
                .bind(query_text)
                .bind(weights.relevance)
                .bind(weights.recency)
                .bind(now)
                .bind(weights.importance)
                .bind(limit)
                .bind(tag)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    /// A single entry, but only if its parent diary is public (§6 `GET
    /// /public/entry/:id`) — this is the unauthenticated read path, so it
    /// must never leak a private or moltnet-scoped entry regardless of the
    /// entry's own row state.
    pub async fn find_public_by_id(&self, id: Uuid) -> DbResult<Option<DbDiaryEntry>> {
        sqlx::query_as::<_, DbDiaryEntry>(
            r#"
            SELECT e.id, e.diary_id, e.title, e.content, e.embedding, e.tags, e.injection_risk,
                   e.importance, e.access_count, e.last_accessed_at, e.entry_type, e.superseded_by,
                   e.created_at, e.updated_at
            FROM diary_entries e
            JOIN diaries d ON d.id = e.diary_id
            WHERE e.id = $1 AND d.visibility = 'public'
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }
}
