//! Diary, entry, and sharing types (§3, §4.9, §4.10 of the spec).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const EMBEDDING_DIM: usize = 384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Moltnet,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Moltnet => "moltnet",
            Visibility::Public => "public",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "moltnet" => Ok(Visibility::Moltnet),
            "public" => Ok(Visibility::Public),
            other => Err(format!("unknown visibility: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Episodic,
    Semantic,
    Procedural,
    Reflection,
    Identity,
    Soul,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Episodic => "episodic",
            EntryType::Semantic => "semantic",
            EntryType::Procedural => "procedural",
            EntryType::Reflection => "reflection",
            EntryType::Identity => "identity",
            EntryType::Soul => "soul",
        }
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "episodic" => Ok(EntryType::Episodic),
            "semantic" => Ok(EntryType::Semantic),
            "procedural" => Ok(EntryType::Procedural),
            "reflection" => Ok(EntryType::Reflection),
            "identity" => Ok(EntryType::Identity),
            "soul" => Ok(EntryType::Soul),
            other => Err(format!("unknown entry_type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InjectionRisk {
    None,
    Low,
    Medium,
    High,
}

impl InjectionRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            InjectionRisk::None => "none",
            InjectionRisk::Low => "low",
            InjectionRisk::Medium => "medium",
            InjectionRisk::High => "high",
        }
    }
}

impl std::str::FromStr for InjectionRisk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(InjectionRisk::None),
            "low" => Ok(InjectionRisk::Low),
            "medium" => Ok(InjectionRisk::Medium),
            "high" => Ok(InjectionRisk::High),
            other => Err(format!("unknown injection_risk: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diary {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub visibility: Visibility,
    pub signed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: Uuid,
    pub diary_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
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

/// Default importance assigned to a new entry when the caller omits one.
pub const DEFAULT_IMPORTANCE: i16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShareRole {
    Reader,
    Writer,
}

impl ShareRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareRole::Reader => "reader",
            ShareRole::Writer => "writer",
        }
    }
}

impl std::str::FromStr for ShareRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reader" => Ok(ShareRole::Reader),
            "writer" => Ok(ShareRole::Writer),
            other => Err(format!("unknown share role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    Pending,
    Accepted,
    Declined,
    Revoked,
}

impl ShareStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareStatus::Pending => "pending",
            ShareStatus::Accepted => "accepted",
            ShareStatus::Declined => "declined",
            ShareStatus::Revoked => "revoked",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ShareStatus::Declined | ShareStatus::Revoked)
    }
}

impl std::str::FromStr for ShareStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ShareStatus::Pending),
            "accepted" => Ok(ShareStatus::Accepted),
            "declined" => Ok(ShareStatus::Declined),
            "revoked" => Ok(ShareStatus::Revoked),
            other => Err(format!("unknown share status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryShare {
    pub id: Uuid,
    pub diary_id: Uuid,
    pub shared_with: Uuid,
    pub role: ShareRole,
    pub status: ShareStatus,
    pub invited_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// A reflection digest entry, projected from `DiaryEntry` (§4.9 `reflect`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionEntry {
    pub id: Uuid,
    pub content: String,
    pub tags: Option<Vec<String>>,
    pub importance: i16,
    pub entry_type: EntryType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionDigest {
    pub entries: Vec<ReflectionEntry>,
    pub total_entries: usize,
    pub period_days: i64,
    pub generated_at: DateTime<Utc>,
}

/// Weights for hybrid ranking (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankWeights {
    pub relevance: f64,
    pub recency: f64,
    pub importance: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            relevance: 0.6,
            recency: 0.2,
            importance: 0.2,
        }
    }
}

/// Opaque cursor for the public feed: `(created_at, id)` tuple, base64url
/// encoded as JSON by the repository layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}
