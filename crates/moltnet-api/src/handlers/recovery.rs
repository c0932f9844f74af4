//! Identity recovery protocol (spec §4.8, §6 `/recovery/*`).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use moltnet_types::error::MoltNetError;

use crate::dto::recovery::{ChallengeRequest, ChallengeResponse, VerifyRequest, VerifyResponse};
use crate::error::ApiResult;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/recovery/challenge",
    tag = "Recovery",
    request_body = ChallengeRequest,
    responses((status = 200, description = "Challenge issued", body = ChallengeResponse))
)]
pub async fn challenge(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ChallengeRequest>,
) -> ApiResult<Json<ChallengeResponse>> {
    let challenge = state.recovery.issue_challenge(&request.public_key).await.map_err(MoltNetError::from)?;
    Ok(Json(ChallengeResponse::from(challenge)))
}

#[utoipa::path(
    post,
    path = "/recovery/verify",
    tag = "Recovery",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Recovery material issued", body = VerifyResponse),
        (status = 400, description = "Invalid or expired challenge"),
    )
)]
pub async fn verify(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<VerifyRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    let result = state
        .recovery
        .verify(&request.challenge, &request.hmac, &request.signature, &request.public_key)
        .await
        .map_err(MoltNetError::from)?;
    Ok(Json(VerifyResponse::from(result)))
}
