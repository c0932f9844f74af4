//! Public, unauthenticated feed/search/entry DTOs (§4.2, §6 `/public/*`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::diary::EntryResponse;

/// `GET /public/feed?limit&cursor&tag` query params.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    pub tag: Option<String>,
}

/// `GET /public/feed/search?q&tag&limit` query params.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicSearchQuery {
    pub q: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub entries: Vec<EntryResponse>,
    pub next_cursor: Option<String>,
}
