//! Unauthenticated public feed, search, and single-entry reads (spec §4.2,
//! §6 `/public/*`).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use moltnet_types::diary::{FeedCursor, RankWeights};
use moltnet_types::error::MoltNetError;

use crate::cursor;
use crate::dto::diary::EntryResponse;
use crate::dto::public::{FeedQuery, FeedResponse, PublicSearchQuery};
use crate::error::ApiResult;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/public/feed",
    tag = "Public",
    params(
        ("limit" = Option<i64>, Query),
        ("cursor" = Option<String>, Query),
        ("tag" = Option<String>, Query)
    ),
    responses((status = 200, description = "Public feed page", body = FeedResponse))
)]
pub async fn feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Json<FeedResponse>> {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let cursor: Option<FeedCursor> = query.cursor.as_deref().and_then(cursor::decode);
    if query.cursor.is_some() && cursor.is_none() {
        return Err(MoltNetError::Validation("malformed cursor".to_string()).into());
    }

    let entries = state
        .diary
        .list_public_feed(cursor, query.tag.as_deref(), limit)
        .await
        .map_err(MoltNetError::from)?;

    let next_cursor = entries
        .len()
        .eq(&(limit as usize))
        .then(|| entries.last().map(|e| cursor::encode(&FeedCursor { created_at: e.created_at, id: e.id })))
        .flatten();

    Ok(Json(FeedResponse { entries: entries.into_iter().map(EntryResponse::from).collect(), next_cursor }))
}

#[utoipa::path(
    get,
    path = "/public/entry/{id}",
    tag = "Public",
    params(("id" = Uuid, Path)),
    responses(
        (status = 200, description = "Public entry", body = EntryResponse),
        (status = 404, description = "Entry absent or not public")
    )
)]
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state.diary.get_public_entry(id).await.map_err(MoltNetError::from)?;
    Ok(Json(EntryResponse::from(entry)))
}

#[utoipa::path(
    get,
    path = "/public/feed/search",
    tag = "Public",
    params(
        ("q" = String, Query),
        ("tag" = Option<String>, Query),
        ("limit" = Option<i64>, Query)
    ),
    responses(
        (status = 200, description = "Public search results", body = [EntryResponse]),
        (status = 400, description = "Empty query")
    )
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PublicSearchQuery>,
) -> ApiResult<Json<Vec<EntryResponse>>> {
    let q = query.q.filter(|s| !s.trim().is_empty()).ok_or_else(|| MoltNetError::Validation("q must not be empty".to_string()))?;
    let limit = query.limit.unwrap_or(20).clamp(1, 200);

    let entries = state
        .diary
        .search_public(&q, query.tag.as_deref(), RankWeights::default(), limit)
        .await
        .map_err(MoltNetError::from)?;

    Ok(Json(entries.into_iter().map(EntryResponse::from).collect()))
}
