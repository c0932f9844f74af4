//! Diary and diary-entry CRUD, hybrid search, and reflection digest
//! (spec §4.9, §6 `/diary/*`).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use moltnet_diary::NewEntry;
use moltnet_types::diary::{EntryType, Visibility, DEFAULT_IMPORTANCE};
use moltnet_types::error::MoltNetError;

use crate::dto::diary::{
    CreateDiaryRequest, CreateEntryRequest, DiaryResponse, EntryResponse, ReflectQuery,
    ReflectionDigestResponse, SearchRequest, UpdateEntryRequest, UpdateVisibilityRequest,
};
use crate::error::ApiResult;
use crate::extractors::{AuthenticatedUser, Pagination, ValidatedJson};
use crate::state::AppState;

// --- diaries --------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/diary",
    tag = "Diary",
    request_body = CreateDiaryRequest,
    responses((status = 200, description = "Diary created", body = DiaryResponse)),
    security(("bearer" = []))
)]
pub async fn create_diary(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateDiaryRequest>,
) -> ApiResult<Json<DiaryResponse>> {
    let visibility = request.visibility.unwrap_or(Visibility::Private);
    let diary =
        state.diary.create_diary(ctx.identity_id, request.name, visibility).await.map_err(MoltNetError::from)?;
    Ok(Json(DiaryResponse::from(diary)))
}

#[utoipa::path(
    get,
    path = "/diary",
    tag = "Diary",
    responses((status = 200, description = "Diaries owned by the caller", body = [DiaryResponse])),
    security(("bearer" = []))
)]
pub async fn list_diaries(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> ApiResult<Json<Vec<DiaryResponse>>> {
    let rows = state.diary.list_owned_diaries(ctx.identity_id).await.map_err(MoltNetError::from)?;
    Ok(Json(rows.into_iter().map(DiaryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/diary/{diary_id}",
    tag = "Diary",
    params(("diary_id" = Uuid, Path)),
    responses((status = 200, description = "Diary", body = DiaryResponse)),
    security(("bearer" = []))
)]
pub async fn get_diary(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(diary_id): Path<Uuid>,
) -> ApiResult<Json<DiaryResponse>> {
    let diary = state.diary.get_diary(diary_id, ctx.identity_id).await.map_err(MoltNetError::from)?;
    Ok(Json(DiaryResponse::from(diary)))
}

#[utoipa::path(
    put,
    path = "/diary/{diary_id}/visibility",
    tag = "Diary",
    params(("diary_id" = Uuid, Path)),
    request_body = UpdateVisibilityRequest,
    responses((status = 200, description = "Visibility updated", body = DiaryResponse)),
    security(("bearer" = []))
)]
pub async fn update_diary_visibility(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(diary_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateVisibilityRequest>,
) -> ApiResult<Json<DiaryResponse>> {
    let diary = state
        .diary
        .update_visibility(diary_id, ctx.identity_id, request.visibility)
        .await
        .map_err(MoltNetError::from)?;
    Ok(Json(DiaryResponse::from(diary)))
}

#[utoipa::path(
    delete,
    path = "/diary/{diary_id}",
    tag = "Diary",
    params(("diary_id" = Uuid, Path)),
    responses((status = 204, description = "Diary deleted")),
    security(("bearer" = []))
)]
pub async fn delete_diary(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(diary_id): Path<Uuid>,
) -> ApiResult<axum::http::StatusCode> {
    state.diary.delete_diary(diary_id, ctx.identity_id).await.map_err(MoltNetError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

// --- entries ----------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/diary/{diary_id}/entries",
    tag = "Diary",
    params(("diary_id" = Uuid, Path)),
    request_body = CreateEntryRequest,
    responses((status = 200, description = "Entry created", body = EntryResponse)),
    security(("bearer" = []))
)]
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(diary_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateEntryRequest>,
) -> ApiResult<Json<EntryResponse>> {
    let new_entry = NewEntry {
        title: request.title,
        content: request.content,
        tags: request.tags,
        importance: request.importance.or(Some(DEFAULT_IMPORTANCE)),
        entry_type: request.entry_type.unwrap_or(EntryType::Episodic),
    };
    let entry = state.diary.create_entry(diary_id, ctx.identity_id, new_entry).await.map_err(MoltNetError::from)?;
    Ok(Json(EntryResponse::from(entry)))
}

#[utoipa::path(
    get,
    path = "/diary/{diary_id}/entries",
    tag = "Diary",
    params(("diary_id" = Uuid, Path), ("limit" = Option<i64>, Query), ("offset" = Option<i64>, Query)),
    responses((status = 200, description = "Entries", body = [EntryResponse])),
    security(("bearer" = []))
)]
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(diary_id): Path<Uuid>,
    Pagination(page): Pagination,
) -> ApiResult<Json<Vec<EntryResponse>>> {
    let rows = state
        .diary
        .list_entries(diary_id, ctx.identity_id, page.limit(1000), page.offset())
        .await
        .map_err(MoltNetError::from)?;
    Ok(Json(rows.into_iter().map(EntryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/diary/entries/{entry_id}",
    tag = "Diary",
    params(("entry_id" = Uuid, Path)),
    responses((status = 200, description = "Entry", body = EntryResponse)),
    security(("bearer" = []))
)]
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(entry_id): Path<Uuid>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state.diary.get_entry(entry_id, ctx.identity_id).await.map_err(MoltNetError::from)?;
    Ok(Json(EntryResponse::from(entry)))
}

#[utoipa::path(
    patch,
    path = "/diary/entries/{entry_id}",
    tag = "Diary",
    params(("entry_id" = Uuid, Path)),
    request_body = UpdateEntryRequest,
    responses((status = 200, description = "Entry updated", body = EntryResponse)),
    security(("bearer" = []))
)]
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(entry_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateEntryRequest>,
) -> ApiResult<Json<EntryResponse>> {
    let title = request.title_update();
    let tags = request.tags_update();
    let entry = state
        .diary
        .update_entry(entry_id, ctx.identity_id, request.content, title, tags, request.importance)
        .await
        .map_err(MoltNetError::from)?;
    Ok(Json(EntryResponse::from(entry)))
}

#[utoipa::path(
    delete,
    path = "/diary/entries/{entry_id}",
    tag = "Diary",
    params(("entry_id" = Uuid, Path)),
    responses((status = 204, description = "Entry deleted")),
    security(("bearer" = []))
)]
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(entry_id): Path<Uuid>,
) -> ApiResult<axum::http::StatusCode> {
    state.diary.delete_entry(entry_id, ctx.identity_id).await.map_err(MoltNetError::from)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/diary/{diary_id}/search",
    tag = "Diary",
    params(("diary_id" = Uuid, Path)),
    request_body = SearchRequest,
    responses((status = 200, description = "Ranked entries", body = [EntryResponse])),
    security(("bearer" = []))
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(diary_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SearchRequest>,
) -> ApiResult<Json<Vec<EntryResponse>>> {
    let weights = request.weights();
    let limit = request.limit.unwrap_or(20).clamp(1, 200);
    let rows = state
        .diary
        .search(diary_id, ctx.identity_id, &request.query, weights, limit)
        .await
        .map_err(MoltNetError::from)?;
    Ok(Json(rows.into_iter().map(EntryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/diary/{diary_id}/reflect",
    tag = "Diary",
    params(("diary_id" = Uuid, Path), ("days" = Option<i64>, Query), ("maxEntries" = Option<usize>, Query)),
    responses((status = 200, description = "Reflection digest", body = ReflectionDigestResponse)),
    security(("bearer" = []))
)]
pub async fn reflect(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(diary_id): Path<Uuid>,
    axum::extract::Query(query): axum::extract::Query<ReflectQuery>,
) -> ApiResult<Json<ReflectionDigestResponse>> {
    let days = query.days.unwrap_or(7).max(1);
    let max_entries = query.max_entries.unwrap_or(50).max(1);
    let digest =
        state.diary.reflect(diary_id, ctx.identity_id, days, max_entries).await.map_err(MoltNetError::from)?;
    Ok(Json(ReflectionDigestResponse::from(digest)))
}
