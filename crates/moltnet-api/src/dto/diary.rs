//! Diary and diary-entry DTOs (§3, §4.9, §6 `/diary/*`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use moltnet_types::diary::{
    Diary, DiaryEntry, EntryType, InjectionRisk, RankWeights, ReflectionDigest, ReflectionEntry,
    Visibility,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateDiaryRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateVisibilityRequest {
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiaryResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub visibility: Visibility,
    pub signed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Diary> for DiaryResponse {
    fn from(d: Diary) -> Self {
        Self {
            id: d.id,
            owner_id: d.owner_id,
            name: d.name,
            visibility: d.visibility,
            signed: d.signed,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEntryRequest {
    pub title: Option<String>,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub importance: Option<i16>,
    #[serde(default)]
    pub entry_type: Option<EntryType>,
}

/// Partial update. Omitting a field leaves it unchanged; for `title` and
/// `tags`, submitting an empty value (`""` / `[]`) clears it — there is no
/// separate null-vs-absent distinction on the wire.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateEntryRequest {
    pub content: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub importance: Option<i16>,
}

impl UpdateEntryRequest {
    pub fn title_update(&self) -> Option<Option<String>> {
        self.title
            .clone()
            .map(|t| if t.is_empty() { None } else { Some(t) })
    }

    pub fn tags_update(&self) -> Option<Option<Vec<String>>> {
        self.tags
            .clone()
            .map(|t| if t.is_empty() { None } else { Some(t) })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: Uuid,
    pub diary_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub tags: Option<Vec<String>>,
    pub injection_risk: InjectionRisk,
    pub importance: i16,
    pub access_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub entry_type: EntryType,
    pub superseded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DiaryEntry> for EntryResponse {
    fn from(e: DiaryEntry) -> Self {
        Self {
            id: e.id,
            diary_id: e.diary_id,
            title: e.title,
            content: e.content,
            tags: e.tags,
            injection_risk: e.injection_risk,
            importance: e.importance,
            access_count: e.access_count,
            last_accessed_at: e.last_accessed_at,
            entry_type: e.entry_type,
            superseded_by: e.superseded_by,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// `POST /diary/search` request body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,
    #[serde(default)]
    pub w_relevance: Option<f64>,
    #[serde(default)]
    pub w_recency: Option<f64>,
    #[serde(default)]
    pub w_importance: Option<f64>,
    pub limit: Option<i64>,
}

impl SearchRequest {
    pub fn weights(&self) -> RankWeights {
        let default = RankWeights::default();
        RankWeights {
            relevance: self.w_relevance.unwrap_or(default.relevance),
            recency: self.w_recency.unwrap_or(default.recency),
            importance: self.w_importance.unwrap_or(default.importance),
        }
    }
}

/// `GET /diary/reflect?days&maxEntries` query params.
#[derive(Debug, Clone, Deserialize)]
pub struct ReflectQuery {
    pub days: Option<i64>,
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionEntryResponse {
    pub id: Uuid,
    pub content: String,
    pub tags: Option<Vec<String>>,
    pub importance: i16,
    pub entry_type: EntryType,
    pub created_at: DateTime<Utc>,
}

impl From<ReflectionEntry> for ReflectionEntryResponse {
    fn from(e: ReflectionEntry) -> Self {
        Self {
            id: e.id,
            content: e.content,
            tags: e.tags,
            importance: e.importance,
            entry_type: e.entry_type,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionDigestResponse {
    pub entries: Vec<ReflectionEntryResponse>,
    pub total_entries: usize,
    pub period_days: i64,
    pub generated_at: DateTime<Utc>,
}

impl From<ReflectionDigest> for ReflectionDigestResponse {
    fn from(d: ReflectionDigest) -> Self {
        Self {
            entries: d.entries.into_iter().map(Into::into).collect(),
            total_entries: d.total_entries,
            period_days: d.period_days,
            generated_at: d.generated_at,
        }
    }
}
