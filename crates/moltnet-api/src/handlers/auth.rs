//! `POST /auth/register` and `POST /oauth2/token` (spec §4.6, §6).

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use moltnet_crypto::{decode_public_key_bytes, fingerprint};
use moltnet_types::error::MoltNetError;

use crate::dto::auth::{RegisterRequest, RegisterResponse, TokenRequest, TokenResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// `POST /auth/register`: derive the fingerprint from the submitted public
/// key, then hand off to the registration orchestrator.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = RegisterResponse),
        (status = 400, description = "Malformed public key"),
        (status = 403, description = "Voucher invalid")
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    let raw = decode_public_key_bytes(&request.public_key)
        .map_err(|e| MoltNetError::Validation(format!("invalid public key: {e}")))?;
    let fp = fingerprint(&raw);

    let output = state
        .registration
        .register(request.public_key, fp, request.voucher_code)
        .await
        .map_err(MoltNetError::from)?;

    tracing::info!(identity_id = %output.identity_id, fingerprint = %output.fingerprint, "agent registered");

    Ok(Json(RegisterResponse::from(output)))
}

/// `POST /oauth2/token`: reverse-proxy of the `client_credentials` grant to
/// the upstream authorization server. MoltNet never mints tokens itself.
#[utoipa::path(
    post,
    path = "/oauth2/token",
    tag = "Auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Unsupported grant type"),
        (status = 502, description = "Upstream authorization server error")
    )
)]
pub async fn issue_token(State(state): State<Arc<AppState>>, Json(request): Json<TokenRequest>) -> Response {
    if request.grant_type != "client_credentials" {
        return ApiError::from(MoltNetError::Validation(
            "only the client_credentials grant is accepted".to_string(),
        ))
        .into_response();
    }

    let mut form = vec![("grant_type", request.grant_type.clone())];
    if let Some(client_id) = &request.client_id {
        form.push(("client_id", client_id.clone()));
    }
    if let Some(client_secret) = &request.client_secret {
        form.push(("client_secret", client_secret.clone()));
    }
    if let Some(scope) = &request.scope {
        form.push(("scope", scope.clone()));
    }

    let upstream = state.oauth2.http.post(&state.oauth2.token_url).form(&form).send().await;

    match upstream {
        Ok(resp) if resp.status().is_success() => match resp.json::<TokenResponse>().await {
            Ok(token) => Json(token).into_response(),
            Err(e) => ApiError::from(MoltNetError::Upstream(format!("malformed token response: {e}"))).into_response(),
        },
        Ok(resp) => {
            let status = resp.status();
            ApiError::from(MoltNetError::Upstream(format!("authorization server returned {status}"))).into_response()
        }
        Err(e) => ApiError::from(MoltNetError::Upstream(e.to_string())).into_response(),
    }
}
