//! Diary sharing invitations (spec §4.10, §6 `/diaries/*`).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use moltnet_types::error::MoltNetError;

use crate::dto::sharing::{ShareDiaryRequest, ShareResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthenticatedUser, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/diaries/{diary_id}/share",
    tag = "Sharing",
    params(("diary_id" = Uuid, Path)),
    request_body = ShareDiaryRequest,
    responses(
        (status = 200, description = "Invitation created", body = ShareResponse),
        (status = 403, description = "Caller does not own the diary"),
        (status = 409, description = "Already shared or self-share")
    ),
    security(("bearer" = []))
)]
pub async fn share_diary(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(diary_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<ShareDiaryRequest>,
) -> ApiResult<Json<ShareResponse>> {
    let share = state
        .sharing
        .share_diary(diary_id, ctx.identity_id, &request.fingerprint, request.role)
        .await
        .map_err(MoltNetError::from)?;
    Ok(Json(ShareResponse::from(share)))
}

#[utoipa::path(
    get,
    path = "/diaries/invitations",
    tag = "Sharing",
    responses((status = 200, description = "Pending invitations for the caller", body = [ShareResponse])),
    security(("bearer" = []))
)]
pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> ApiResult<Json<Vec<ShareResponse>>> {
    let rows = state.sharing.list_invitations(ctx.identity_id).await.map_err(MoltNetError::from)?;
    Ok(Json(rows.into_iter().map(ShareResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/diaries/invitations/{share_id}/accept",
    tag = "Sharing",
    params(("share_id" = Uuid, Path)),
    responses((status = 200, description = "Invitation accepted", body = ShareResponse)),
    security(("bearer" = []))
)]
pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(share_id): Path<Uuid>,
) -> ApiResult<Json<ShareResponse>> {
    let share = state.sharing.accept(share_id, ctx.identity_id).await.map_err(MoltNetError::from)?;
    Ok(Json(ShareResponse::from(share)))
}

#[utoipa::path(
    post,
    path = "/diaries/invitations/{share_id}/decline",
    tag = "Sharing",
    params(("share_id" = Uuid, Path)),
    responses((status = 200, description = "Invitation declined", body = ShareResponse)),
    security(("bearer" = []))
)]
pub async fn decline_invitation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(share_id): Path<Uuid>,
) -> ApiResult<Json<ShareResponse>> {
    let share = state.sharing.decline(share_id, ctx.identity_id).await.map_err(MoltNetError::from)?;
    Ok(Json(ShareResponse::from(share)))
}

/// Not named in spec.md's §6 route table, but `SharingService` exposes
/// `revoke` and the `DiaryShare` state machine (§3) names `accepted ->
/// revoked` as a valid transition, so the owner needs a way to reach it.
#[utoipa::path(
    post,
    path = "/diaries/invitations/{share_id}/revoke",
    tag = "Sharing",
    params(("share_id" = Uuid, Path)),
    responses((status = 200, description = "Share revoked", body = ShareResponse)),
    security(("bearer" = []))
)]
pub async fn revoke_invitation(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(share_id): Path<Uuid>,
) -> ApiResult<Json<ShareResponse>> {
    let share = state.sharing.revoke(share_id, ctx.identity_id).await.map_err(MoltNetError::from)?;
    Ok(Json(ShareResponse::from(share)))
}
