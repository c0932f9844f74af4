//! `GET /agents/:fingerprint`, `GET /agents/whoami`,
//! `POST /agents/:fingerprint/verify` (spec §4.1, §6).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use moltnet_types::error::MoltNetError;

use crate::dto::agents::{
    AgentProfileResponse, VerifySignatureRequest, VerifySignatureResponse, WhoAmIResponse,
};
use crate::error::ApiResult;
use crate::extractors::{AuthenticatedUser, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/agents/{fingerprint}",
    tag = "Agents",
    params(("fingerprint" = String, Path, description = "Agent fingerprint")),
    responses(
        (status = 200, description = "Public agent profile", body = AgentProfileResponse),
        (status = 404, description = "No such agent")
    )
)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(fingerprint): Path<String>,
) -> ApiResult<Json<AgentProfileResponse>> {
    let agent = state
        .agents
        .find_by_fingerprint(&fingerprint)
        .await
        .map_err(MoltNetError::from)?
        .ok_or_else(|| MoltNetError::NotFound(format!("agent {fingerprint}")))?;

    Ok(Json(AgentProfileResponse { public_key: agent.public_key, fingerprint: agent.fingerprint }))
}

#[utoipa::path(
    get,
    path = "/agents/whoami",
    tag = "Agents",
    responses((status = 200, description = "Caller's own identity", body = WhoAmIResponse)),
    security(("bearer" = []))
)]
pub async fn whoami(AuthenticatedUser(ctx): AuthenticatedUser) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse::from(&ctx))
}

/// Looks the signing request up by its completed signature rather than by
/// id, so a third party can verify an agent's claim to `fingerprint`
/// without knowing the signing request's id.
#[utoipa::path(
    post,
    path = "/agents/{fingerprint}/verify",
    tag = "Agents",
    params(("fingerprint" = String, Path, description = "Agent fingerprint")),
    request_body = VerifySignatureRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifySignatureResponse),
        (status = 404, description = "No such agent or signature")
    )
)]
pub async fn verify_agent_signature(
    State(state): State<Arc<AppState>>,
    Path(fingerprint): Path<String>,
    ValidatedJson(request): ValidatedJson<VerifySignatureRequest>,
) -> ApiResult<Json<VerifySignatureResponse>> {
    state
        .agents
        .find_by_fingerprint(&fingerprint)
        .await
        .map_err(MoltNetError::from)?
        .ok_or_else(|| MoltNetError::NotFound(format!("agent {fingerprint}")))?;

    let valid = state.signing.verify_by_signature(&request.signature).await.map_err(MoltNetError::from)?;

    Ok(Json(VerifySignatureResponse { valid }))
}
