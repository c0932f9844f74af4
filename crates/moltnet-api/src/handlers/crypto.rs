//! Standalone crypto verification and signing-request lifecycle (spec
//! §4.1, §4.7, §6 `/crypto/*`).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use moltnet_types::error::MoltNetError;
use moltnet_types::signing::SigningStatus;

use crate::dto::crypto::{
    CreateSigningRequestRequest, IdentityResponse, SigningRequestListQuery, SigningRequestResponse,
    SubmitSignatureRequest, VerifyRequest, VerifyResponse,
};
use crate::error::ApiResult;
use crate::extractors::{AuthenticatedUser, Pagination, ValidatedJson};
use crate::state::AppState;

/// `POST /crypto/verify`: standalone Ed25519 verification, no stored
/// signing request involved.
#[utoipa::path(
    post,
    path = "/crypto/verify",
    tag = "Crypto",
    request_body = VerifyRequest,
    responses((status = 200, description = "Verification result", body = VerifyResponse))
)]
pub async fn verify(ValidatedJson(request): ValidatedJson<VerifyRequest>) -> Json<VerifyResponse> {
    let valid = moltnet_crypto::verify(request.message.as_bytes(), &request.signature, &request.public_key);
    Json(VerifyResponse { valid })
}

#[utoipa::path(
    get,
    path = "/crypto/identity",
    tag = "Crypto",
    responses((status = 200, description = "Caller's identity", body = IdentityResponse)),
    security(("bearer" = []))
)]
pub async fn identity(AuthenticatedUser(ctx): AuthenticatedUser) -> Json<IdentityResponse> {
    Json(IdentityResponse::from(&ctx))
}

#[utoipa::path(
    post,
    path = "/crypto/signing-requests",
    tag = "Crypto",
    request_body = CreateSigningRequestRequest,
    responses((status = 201, description = "Signing request created", body = SigningRequestResponse)),
    security(("bearer" = []))
)]
pub async fn create_signing_request(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateSigningRequestRequest>,
) -> ApiResult<(StatusCode, Json<SigningRequestResponse>)> {
    let created = state.signing.create(ctx.identity_id, request.message).await.map_err(MoltNetError::from)?;
    Ok((StatusCode::CREATED, Json(SigningRequestResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/crypto/signing-requests",
    tag = "Crypto",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("limit" = Option<i64>, Query),
        ("offset" = Option<i64>, Query)
    ),
    responses((status = 200, description = "Signing requests", body = [SigningRequestResponse])),
    security(("bearer" = []))
)]
pub async fn list_signing_requests(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Query(query): Query<SigningRequestListQuery>,
    Pagination(page): Pagination,
) -> ApiResult<Json<Vec<SigningRequestResponse>>> {
    if let Some(status) = &query.status {
        status.parse::<SigningStatus>().map_err(MoltNetError::Validation)?;
    }

    let rows = state
        .signing
        .list(ctx.identity_id, query.status.as_deref(), page.limit(1000), page.offset())
        .await
        .map_err(MoltNetError::from)?;

    Ok(Json(rows.into_iter().map(SigningRequestResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/crypto/signing-requests/{id}",
    tag = "Crypto",
    params(("id" = uuid::Uuid, Path)),
    responses(
        (status = 200, description = "Signing request", body = SigningRequestResponse),
        (status = 404, description = "Not found or not owned by caller")
    ),
    security(("bearer" = []))
)]
pub async fn get_signing_request(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(id): Path<uuid::Uuid>,
) -> ApiResult<Json<SigningRequestResponse>> {
    let request = state.signing.find(id).await.map_err(MoltNetError::from)?;
    if request.agent_id != ctx.identity_id {
        return Err(MoltNetError::NotFound(format!("signing request {id}")).into());
    }
    Ok(Json(SigningRequestResponse::from(request)))
}

#[utoipa::path(
    post,
    path = "/crypto/signing-requests/{id}/sign",
    tag = "Crypto",
    params(("id" = uuid::Uuid, Path)),
    request_body = SubmitSignatureRequest,
    responses(
        (status = 200, description = "Signature recorded", body = SigningRequestResponse),
        (status = 409, description = "Signing request expired or already completed")
    ),
    security(("bearer" = []))
)]
pub async fn submit_signature(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(id): Path<uuid::Uuid>,
    ValidatedJson(request): ValidatedJson<SubmitSignatureRequest>,
) -> ApiResult<Json<SigningRequestResponse>> {
    let completed =
        state.signing.submit(id, ctx.identity_id, &request.signature).await.map_err(MoltNetError::from)?;
    Ok(Json(SigningRequestResponse::from(completed)))
}
