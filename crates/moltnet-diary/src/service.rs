//! `DiaryService` (C9, spec §4.9): the write/read/search/reflect pipeline
//! sitting on top of `DiaryRepo` / `DiaryEntryRepo` and the `C4` permission
//! adapter. Relationship grants are emitted as background durable
//! workflows (`WorkflowEngine::start`) rather than awaited inline — the
//! request that created the row does not block on Zanzibar's eventual
//! consistency, per §5's "relationship writes are eventually consistent".

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use moltnet_db::{DiaryEntryRepo, DiaryRepo, HybridSearchParams};
use moltnet_policy::PermissionAdapter;
use moltnet_types::diary::{
    Diary, DiaryEntry, EntryType, FeedCursor, InjectionRisk, RankWeights, ReflectionDigest, ReflectionEntry,
    Visibility, DEFAULT_IMPORTANCE,
};
use moltnet_workflow::{RetryPolicy, Step, Workflow, WorkflowEngine, WorkflowError};

use crate::embedding::{embed_passage, embed_query, embedding_model};
use crate::error::{DiaryError, DiaryResult};
use crate::injection;

pub struct DiaryService {
    diaries: DiaryRepo,
    entries: DiaryEntryRepo,
    permissions: Arc<PermissionAdapter>,
    workflow: Arc<WorkflowEngine>,
}

/// Fields a caller may set when writing a new entry; everything else
/// (embedding, injection risk, access bookkeeping) is derived.
pub struct NewEntry {
    pub title: Option<String>,
    pub content: String,
    pub tags: Option<Vec<String>>,
    pub importance: Option<i16>,
    pub entry_type: EntryType,
}

impl DiaryService {
    pub fn new(
        diaries: DiaryRepo,
        entries: DiaryEntryRepo,
        permissions: Arc<PermissionAdapter>,
        workflow: Arc<WorkflowEngine>,
    ) -> Self {
        Self { diaries, entries, permissions, workflow }
    }

    // --- diary-level ----------------------------------------------------

    pub async fn create_diary(&self, owner_id: Uuid, name: String, visibility: Visibility) -> DiaryResult<Diary> {
        if name.trim().is_empty() {
            return Err(DiaryError::Validation("diary name must not be empty".to_string()));
        }

        let db_diary = self.diaries.create(owner_id, name.trim(), visibility.as_str()).await?;
        let diary: Diary = db_diary.try_into().map_err(DiaryError::Storage)?;

        self.emit_grant_workflow(
            "diary-grant-owner",
            Arc::new({
                let permissions = self.permissions.clone();
                let diary_id = diary.id.to_string();
                let owner_id = owner_id.to_string();
                move |ctx| {
                    let permissions = permissions.clone();
                    let diary_id = diary_id.clone();
                    let owner_id = owner_id.clone();
                    Box::pin(async move {
                        permissions
                            .grant_diary_owner(&diary_id, &owner_id)
                            .await
                            .map_err(|e| step_error(e.to_string()))?;
                        Ok(ctx.input)
                    })
                }
            }),
        )
        .await;

        Ok(diary)
    }

    pub async fn get_diary(&self, diary_id: Uuid, agent_id: Uuid) -> DiaryResult<Diary> {
        let db_diary = self.diaries.find_by_id(diary_id).await?.ok_or(DiaryError::DiaryNotFound(diary_id))?;

        if !self.permissions.can_read_diary(&diary_id.to_string(), &agent_id.to_string()).await? {
            return Err(DiaryError::ReadForbidden);
        }

        db_diary.try_into().map_err(DiaryError::Storage)
    }

    pub async fn list_owned_diaries(&self, owner_id: Uuid) -> DiaryResult<Vec<Diary>> {
        let rows = self.diaries.list_by_owner(owner_id).await?;
        rows.into_iter().map(|r| r.try_into().map_err(DiaryError::Storage)).collect()
    }

    pub async fn update_visibility(
        &self,
        diary_id: Uuid,
        agent_id: Uuid,
        visibility: Visibility,
    ) -> DiaryResult<Diary> {
        if !self.permissions.can_manage_diary(&diary_id.to_string(), &agent_id.to_string()).await? {
            return Err(DiaryError::ManageForbidden);
        }

        let db_diary = self.diaries.update_visibility(diary_id, visibility.as_str()).await?;
        db_diary.try_into().map_err(DiaryError::Storage)
    }

    pub async fn delete_diary(&self, diary_id: Uuid, agent_id: Uuid) -> DiaryResult<()> {
        let db_diary = self.diaries.find_by_id(diary_id).await?.ok_or(DiaryError::DiaryNotFound(diary_id))?;

        if !self.permissions.can_manage_diary(&diary_id.to_string(), &agent_id.to_string()).await? {
            return Err(DiaryError::ManageForbidden);
        }

        self.diaries.delete(diary_id).await?;

        self.emit_grant_workflow(
            "diary-remove-relations",
            Arc::new({
                let permissions = self.permissions.clone();
                let diary_id = diary_id.to_string();
                let owner_id = db_diary.owner_id.to_string();
                move |ctx| {
                    let permissions = permissions.clone();
                    let diary_id = diary_id.clone();
                    let owner_id = owner_id.clone();
                    Box::pin(async move {
                        permissions
                            .remove_diary_relations(&diary_id, &owner_id)
                            .await
                            .map_err(|e| step_error(e.to_string()))?;
                        Ok(ctx.input)
                    })
                }
            }),
        )
        .await;

        Ok(())
    }

    // --- entry-level ------------------------------------------------------

    pub async fn create_entry(&self, diary_id: Uuid, agent_id: Uuid, new_entry: NewEntry) -> DiaryResult<DiaryEntry> {
        if new_entry.content.trim().is_empty() {
            return Err(DiaryError::Validation("entry content must not be empty".to_string()));
        }

        if !self.permissions.can_write_diary(&diary_id.to_string(), &agent_id.to_string()).await? {
            return Err(DiaryError::WriteForbidden);
        }

        let model = embedding_model().await;
        let embedding = embed_passage(model.as_ref(), &new_entry.content).await;
        let risk = injection::scan(&new_entry.content);
        let importance = new_entry.importance.unwrap_or(DEFAULT_IMPORTANCE);

        let db_entry = self
            .entries
            .create(
                diary_id,
                new_entry.title.as_deref(),
                &new_entry.content,
                embedding.as_deref(),
                new_entry.tags.as_deref(),
                risk.as_str(),
                importance,
                new_entry.entry_type.as_str(),
            )
            .await?;
        let entry: DiaryEntry = db_entry.try_into().map_err(DiaryError::Storage)?;

        self.emit_grant_workflow(
            "diary-entry-grant-owner",
            Arc::new({
                let permissions = self.permissions.clone();
                let entry_id = entry.id.to_string();
                let agent_id = agent_id.to_string();
                move |ctx| {
                    let permissions = permissions.clone();
                    let entry_id = entry_id.clone();
                    let agent_id = agent_id.clone();
                    Box::pin(async move {
                        permissions
                            .grant_ownership(&entry_id, &agent_id)
                            .await
                            .map_err(|e| step_error(e.to_string()))?;
                        Ok(ctx.input)
                    })
                }
            }),
        )
        .await;

        Ok(entry)
    }

    pub async fn get_entry(&self, entry_id: Uuid, agent_id: Uuid) -> DiaryResult<DiaryEntry> {
        let db_entry = self.entries.find_by_id(entry_id).await?.ok_or(DiaryError::EntryNotFound(entry_id))?;

        if !self.permissions.can_view_entry(&entry_id.to_string(), &agent_id.to_string()).await? {
            return Err(DiaryError::ReadForbidden);
        }

        self.entries.touch_access(entry_id).await?;
        db_entry.try_into().map_err(DiaryError::Storage)
    }

    pub async fn list_entries(
        &self,
        diary_id: Uuid,
        agent_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DiaryResult<Vec<DiaryEntry>> {
        if !self.permissions.can_read_diary(&diary_id.to_string(), &agent_id.to_string()).await? {
            return Err(DiaryError::ReadForbidden);
        }

        let rows = self.entries.list_by_diary(diary_id, limit, offset).await?;
        rows.into_iter().map(|r| r.try_into().map_err(DiaryError::Storage)).collect()
    }

    /// Update an entry. When `content` is `Some`, the update goes through
    /// `supersede`: a fresh row is inserted with the new content and
    /// embedding, and the old row is linked forward via `superseded_by`
    /// rather than mutated in place, so the `superseded_by` chain stays an
    /// append-only, forward-only history (§3 invariant).
    pub async fn update_entry(
        &self,
        entry_id: Uuid,
        agent_id: Uuid,
        content: Option<String>,
        title: Option<Option<String>>,
        tags: Option<Option<Vec<String>>>,
        importance: Option<i16>,
    ) -> DiaryResult<DiaryEntry> {
        let existing = self.entries.find_by_id(entry_id).await?.ok_or(DiaryError::EntryNotFound(entry_id))?;

        if !self.permissions.can_edit_entry(&entry_id.to_string(), &agent_id.to_string()).await? {
            return Err(DiaryError::WriteForbidden);
        }

        let new_title = title.unwrap_or_else(|| existing.title.clone());
        let new_tags = tags.unwrap_or_else(|| existing.tags.clone());
        let new_importance = importance.unwrap_or(existing.importance);
        let entry_type: EntryType = existing.entry_type.parse().map_err(DiaryError::Validation)?;
        let risk: InjectionRisk = existing.injection_risk.parse().map_err(DiaryError::Validation)?;

        let Some(new_content) = content else {
            // No content change: nothing to re-embed or supersede, but the
            // repo has no in-place field update, so we go through the same
            // create+supersede path with the unchanged content.
            let db_entry = self
                .entries
                .create(
                    existing.diary_id,
                    new_title.as_deref(),
                    &existing.content,
                    existing.embedding.as_ref().map(|v| v.to_vec()).as_deref(),
                    new_tags.as_deref(),
                    risk.as_str(),
                    new_importance,
                    entry_type.as_str(),
                )
                .await?;
            self.entries.supersede(entry_id, db_entry.id).await?;
            return db_entry.try_into().map_err(DiaryError::Storage);
        };

        if new_content.trim().is_empty() {
            return Err(DiaryError::Validation("entry content must not be empty".to_string()));
        }

        let model = embedding_model().await;
        let embedding = embed_passage(model.as_ref(), &new_content).await;
        let new_risk = injection::scan(&new_content);

        let db_entry = self
            .entries
            .create(
                existing.diary_id,
                new_title.as_deref(),
                &new_content,
                embedding.as_deref(),
                new_tags.as_deref(),
                new_risk.as_str(),
                new_importance,
                entry_type.as_str(),
            )
            .await?;
        self.entries.supersede(entry_id, db_entry.id).await?;

        self.emit_grant_workflow(
            "diary-entry-grant-owner",
            Arc::new({
                let permissions = self.permissions.clone();
                let entry_id = db_entry.id.to_string();
                let agent_id = agent_id.to_string();
                move |ctx| {
                    let permissions = permissions.clone();
                    let entry_id = entry_id.clone();
                    let agent_id = agent_id.clone();
                    Box::pin(async move {
                        permissions
                            .grant_ownership(&entry_id, &agent_id)
                            .await
                            .map_err(|e| step_error(e.to_string()))?;
                        Ok(ctx.input)
                    })
                }
            }),
        )
        .await;

        db_entry.try_into().map_err(DiaryError::Storage)
    }

    pub async fn delete_entry(&self, entry_id: Uuid, agent_id: Uuid) -> DiaryResult<()> {
        self.entries.find_by_id(entry_id).await?.ok_or(DiaryError::EntryNotFound(entry_id))?;

        if !self.permissions.can_delete_entry(&entry_id.to_string(), &agent_id.to_string()).await? {
            return Err(DiaryError::ManageForbidden);
        }

        self.entries.delete(entry_id).await?;

        self.emit_grant_workflow(
            "diary-entry-remove-relations",
            Arc::new({
                let permissions = self.permissions.clone();
                let entry_id = entry_id.to_string();
                let agent_id = agent_id.to_string();
                move |ctx| {
                    let permissions = permissions.clone();
                    let entry_id = entry_id.clone();
                    let agent_id = agent_id.clone();
                    Box::pin(async move {
                        permissions
                            .remove_entry_relations(&entry_id, &agent_id)
                            .await
                            .map_err(|e| step_error(e.to_string()))?;
                        Ok(ctx.input)
                    })
                }
            }),
        )
        .await;

        Ok(())
    }

    /// Hybrid-ranked search over a single diary's unsuperseded entries
    /// (§4.9). The query is embedded with the `"query: "` prefix so it
    /// lands in the same representation space entries were stored under.
    pub async fn search(
        &self,
        diary_id: Uuid,
        agent_id: Uuid,
        query_text: &str,
        weights: RankWeights,
        limit: i64,
    ) -> DiaryResult<Vec<DiaryEntry>> {
        if !self.permissions.can_read_diary(&diary_id.to_string(), &agent_id.to_string()).await? {
            return Err(DiaryError::ReadForbidden);
        }

        let model = embedding_model().await;
        let query_embedding = embed_query(model.as_ref(), query_text).await;

        let rows = self
            .entries
            .hybrid_search(HybridSearchParams {
                diary_ids: &[diary_id],
                query_text,
                query_embedding: query_embedding.as_deref(),
                weights,
                limit,
            })
            .await?;

        rows.into_iter().map(|r| r.entry.try_into().map_err(DiaryError::Storage)).collect()
    }

    /// Build a reflection digest (§4.9 `reflect`): entries from the last
    /// `days`, ranked `importance DESC, created_at DESC`, truncated to
    /// `max_entries`.
    pub async fn reflect(
        &self,
        diary_id: Uuid,
        agent_id: Uuid,
        days: i64,
        max_entries: usize,
    ) -> DiaryResult<ReflectionDigest> {
        if !self.permissions.can_read_diary(&diary_id.to_string(), &agent_id.to_string()).await? {
            return Err(DiaryError::ReadForbidden);
        }

        let now = Utc::now();
        let cutoff = now - chrono::Duration::days(days);

        let rows = self.entries.list_by_diary(diary_id, i64::MAX.min(10_000), 0).await?;

        let mut candidates: Vec<ReflectionEntry> = rows
            .into_iter()
            .filter(|r| r.superseded_by.is_none() && r.created_at >= cutoff)
            .map(|r| {
                let entry_type: EntryType = r.entry_type.parse().unwrap_or(EntryType::Episodic);
                ReflectionEntry {
                    id: r.id,
                    content: r.content,
                    tags: r.tags,
                    importance: r.importance,
                    entry_type,
                    created_at: r.created_at,
                }
            })
            .collect();

        candidates.sort_by(|a, b| b.importance.cmp(&a.importance).then(b.created_at.cmp(&a.created_at)));

        let total_entries = candidates.len();
        candidates.truncate(max_entries);

        Ok(ReflectionDigest { entries: candidates, total_entries, period_days: days, generated_at: now })
    }

    // --- public feed (§6 `GET /public/feed`, unauthenticated) -------------

    /// Cursor-paginated feed of every `public`-visibility entry across all
    /// owners, newest-first (§4.2 `listPublic`).
    pub async fn list_public_feed(
        &self,
        cursor: Option<FeedCursor>,
        tag: Option<&str>,
        limit: i64,
    ) -> DiaryResult<Vec<DiaryEntry>> {
        let before = cursor.map(|c| (c.created_at, c.id));
        let rows = self.entries.list_public_feed(before, tag, limit).await?;
        rows.into_iter().map(|r| r.try_into().map_err(DiaryError::Storage)).collect()
    }

    /// Hybrid search restricted to public entries across all owners (§4.2
    /// `searchPublic`).
    pub async fn search_public(
        &self,
        query_text: &str,
        tag: Option<&str>,
        weights: RankWeights,
        limit: i64,
    ) -> DiaryResult<Vec<DiaryEntry>> {
        let model = embedding_model().await;
        let query_embedding = embed_query(model.as_ref(), query_text).await;

        let rows = self
            .entries
            .search_public(query_text, query_embedding.as_deref(), tag, weights, limit)
            .await?;

        rows.into_iter().map(|r| r.entry.try_into().map_err(DiaryError::Storage)).collect()
    }

    /// A single entry, visible only if its parent diary is public (§6 `GET
    /// /public/entry/:id`).
    pub async fn get_public_entry(&self, entry_id: Uuid) -> DiaryResult<DiaryEntry> {
        let db_entry = self
            .entries
            .find_public_by_id(entry_id)
            .await?
            .ok_or(DiaryError::EntryNotFound(entry_id))?;
        db_entry.try_into().map_err(DiaryError::Storage)
    }

    // --- internals --------------------------------------------------------

    /// Fire a single-step, retried relationship-write workflow in the
    /// background (§4.3/§4.9: the write path does not block on Zanzibar's
    /// eventual consistency). Failure to even enqueue the workflow is
    /// logged rather than surfaced: the row this grant is for has already
    /// been committed, and a missing grant is addressed by the workflow's
    /// own retry policy, not by failing a request that already succeeded.
    async fn emit_grant_workflow(&self, name: &'static str, run: moltnet_workflow::StepFn) {
        let workflow = Arc::new(Workflow::new(name, vec![Step::new(name, run).with_retry(RetryPolicy::relationship_write())]));
        if let Err(err) = self.workflow.start(workflow, json!({})).await {
            tracing::error!(workflow = name, error = %err, "failed to enqueue relationship-write workflow");
        }
    }
}

fn step_error(message: String) -> WorkflowError {
    WorkflowError::MalformedStepOutput(message)
}
