//! Voucher lifecycle types (§3, §4.5 of the spec).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default time-to-live for a freshly issued voucher.
pub const VOUCHER_TTL_HOURS: i64 = 24;

/// Maximum number of simultaneously active (unredeemed, unexpired)
/// vouchers a single issuer may hold.
pub const VOUCHER_MAX_ACTIVE_PER_ISSUER: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: Uuid,
    pub code: String,
    pub issuer_id: Uuid,
    pub redeemed_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Voucher {
    pub fn is_redeemed(&self) -> bool {
        self.redeemed_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_redeemed() && !self.is_expired_at(now)
    }
}
