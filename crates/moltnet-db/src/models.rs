//! Database row models - mapped from PostgreSQL tables.
//!
//! Enum-valued columns are stored as `TEXT` and kept as `String` here,
//! converting at the domain boundary rather than inside `FromRow`.
//! Each `DbX` has a fallible
//! `TryFrom<DbX> for X` into its `moltnet_types` counterpart.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use moltnet_types::diary::{Diary, DiaryEntry, DiaryShare, EntryType, InjectionRisk, ShareRole, ShareStatus, Visibility};
use moltnet_types::error::MoltNetError;
use moltnet_types::recovery::RecoveryResult;
use moltnet_types::signing::{SigningRequest, SigningStatus};
use moltnet_types::voucher::Voucher;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbAgent {
    pub identity_id: Uuid,
    pub public_key: String,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbVoucher {
    pub id: Uuid,
    pub code: String,
    pub issuer_id: Uuid,
    pub redeemed_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DbVoucher> for Voucher {
    fn from(v: DbVoucher) -> Self {
        Voucher {
            id: v.id,
            code: v.code,
            issuer_id: v.issuer_id,
            redeemed_by: v.redeemed_by,
            expires_at: v.expires_at,
            redeemed_at: v.redeemed_at,
            created_at: v.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbDiary {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub visibility: String,
    pub signed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbDiary> for Diary {
    type Error = MoltNetError;

    fn try_from(d: DbDiary) -> Result<Self, Self::Error> {
        Ok(Diary {
            id: d.id,
            owner_id: d.owner_id,
            name: d.name,
            visibility: Visibility::from_str(&d.visibility)
                .map_err(|e| MoltNetError::internal(format!("corrupt visibility column: {e}")))?,
            signed: d.signed,
            created_at: d.created_at,
            updated_at: d.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbDiaryEntry {
    pub id: Uuid,
    pub diary_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub embedding: Option<Vector>,
    pub tags: Option<Vec<String>>,
    pub injection_risk: String,
    pub importance: i16,
    pub access_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub entry_type: String,
    pub superseded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbDiaryEntry> for DiaryEntry {
    type Error = MoltNetError;

    fn try_from(e: DbDiaryEntry) -> Result<Self, Self::Error> {
        Ok(DiaryEntry {
            id: e.id,
            diary_id: e.diary_id,
            title: e.title,
            content: e.content,
            embedding: e.embedding.map(|v| v.to_vec()),
            tags: e.tags,
            injection_risk: InjectionRisk::from_str(&e.injection_risk)
                .map_err(|err| MoltNetError::internal(format!("corrupt injection_risk column: {err}")))?,
            importance: e.importance,
            access_count: e.access_count,
            last_accessed_at: e.last_accessed_at,
            entry_type: EntryType::from_str(&e.entry_type)
                .map_err(|err| MoltNetError::internal(format!("corrupt entry_type column: {err}")))?,
            superseded_by: e.superseded_by,
            created_at: e.created_at,
            updated_at: e.updated_at,
        })
    }
}

/// A diary entry row joined with a hybrid-search relevance score (§4.9).
/// `sqlx::FromRow` has no flatten support, so this reads every entry
/// column directly alongside the computed `score`.
#[derive(Debug, Clone)]
pub struct DbScoredDiaryEntry {
    pub entry: DbDiaryEntry,
    pub score: f64,
}

impl FromRow<'_, sqlx::postgres::PgRow> for DbScoredDiaryEntry {
    fn from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<Self> {
        use sqlx::Row;
        Ok(Self {
            entry: DbDiaryEntry {
                id: row.try_get("id")?,
                diary_id: row.try_get("diary_id")?,
                title: row.try_get("title")?,
                content: row.try_get("content")?,
                embedding: row.try_get("embedding")?,
                tags: row.try_get("tags")?,
                injection_risk: row.try_get("injection_risk")?,
                importance: row.try_get("importance")?,
                access_count: row.try_get("access_count")?,
                last_accessed_at: row.try_get("last_accessed_at")?,
                entry_type: row.try_get("entry_type")?,
                superseded_by: row.try_get("superseded_by")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            },
            score: row.try_get("score")?,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbDiaryShare {
    pub id: Uuid,
    pub diary_id: Uuid,
    pub shared_with: Uuid,
    pub role: String,
    pub status: String,
    pub invited_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbDiaryShare> for DiaryShare {
    type Error = MoltNetError;

    fn try_from(s: DbDiaryShare) -> Result<Self, Self::Error> {
        Ok(DiaryShare {
            id: s.id,
            diary_id: s.diary_id,
            shared_with: s.shared_with,
            role: ShareRole::from_str(&s.role)
                .map_err(|e| MoltNetError::internal(format!("corrupt role column: {e}")))?,
            status: ShareStatus::from_str(&s.status)
                .map_err(|e| MoltNetError::internal(format!("corrupt status column: {e}")))?,
            invited_at: s.invited_at,
            responded_at: s.responded_at,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbSigningRequest {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub message: String,
    pub nonce: String,
    pub status: String,
    pub signature: Option<String>,
    pub valid: Option<bool>,
    pub workflow_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbSigningRequest> for SigningRequest {
    type Error = MoltNetError;

    fn try_from(r: DbSigningRequest) -> Result<Self, Self::Error> {
        Ok(SigningRequest {
            id: r.id,
            agent_id: r.agent_id,
            message: r.message,
            nonce: r.nonce,
            status: SigningStatus::from_str(&r.status)
                .map_err(|e| MoltNetError::internal(format!("corrupt status column: {e}")))?,
            signature: r.signature,
            valid: r.valid,
            workflow_id: r.workflow_id,
            created_at: r.created_at,
            expires_at: r.expires_at,
            completed_at: r.completed_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbWorkflowRun {
    pub id: Uuid,
    pub kind: String,
    pub status: String,
    pub context: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbWorkflowStep {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub step_index: i32,
    pub step_name: String,
    pub status: String,
    pub attempt: i32,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbWorkflowSignal {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub signal_name: String,
    pub payload: serde_json::Value,
    pub consumed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRelationshipTuple {
    pub id: Uuid,
    pub namespace: String,
    pub object: String,
    pub relation: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

/// Recovery materials issued alongside a stored `used_recovery_nonces` row
/// are not themselves persisted (§4.8 step 7: the recovery code and flow
/// URL are generated fresh and handed back, not retained). `RecoveryResult`
/// lives in `moltnet_types`; this module only persists nonce consumption.
pub type DbRecoveryResult = RecoveryResult;
