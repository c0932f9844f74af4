//! Diary sharing and invitation DTOs (§4.10, §6 `/diaries/*`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use moltnet_types::diary::{DiaryShare, ShareRole, ShareStatus};

/// `POST /diaries/:id/share` request body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ShareDiaryRequest {
    #[validate(length(min = 1, message = "fingerprint must not be empty"))]
    pub fingerprint: String,
    pub role: ShareRole,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub id: Uuid,
    pub diary_id: Uuid,
    pub shared_with: Uuid,
    pub role: ShareRole,
    pub status: ShareStatus,
    pub invited_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl From<DiaryShare> for ShareResponse {
    fn from(s: DiaryShare) -> Self {
        Self {
            id: s.id,
            diary_id: s.diary_id,
            shared_with: s.shared_with,
            role: s.role,
            status: s.status,
            invited_at: s.invited_at,
            responded_at: s.responded_at,
        }
    }
}
