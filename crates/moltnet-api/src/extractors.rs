//! Custom Axum extractors built on the `FromRequestParts`/`FromRequest`
//! traits. MoltNet has no upstream auth middleware to populate request
//! extensions, so `AuthenticatedUser` does the bearer-token validation
//! and agent lookup itself, since both depend on `AppState`.

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Json};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use moltnet_auth::AuthError;
use moltnet_types::agent::AuthContext;
use moltnet_types::error::MoltNetError;

use crate::error::ApiError;
use crate::state::AppState;

/// Bearer-resolved identity (spec §4.4): the token validator establishes
/// `identity_id`/`client_id`/`scopes`; the matching `agents` row fills in
/// `public_key`/`fingerprint`. Missing either half is unauthorized, not a
/// 500 — an agent row can be legitimately absent if the token belongs to
/// an OAuth2 client that never completed MoltNet registration.
pub struct AuthenticatedUser(pub AuthContext);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let validated = state.auth.validate(&token).await.map_err(auth_error_response)?;

        // spec §4.4: a missing/empty clientId fails closed regardless of
        // whether the token itself verified.
        if validated.client_id.is_empty() {
            return Err(ApiError::from(MoltNetError::Unauthorized).into_response());
        }

        let agent = state
            .agents
            .find_by_identity_id(validated.identity_id)
            .await
            .map_err(|e| ApiError::from(MoltNetError::from(e)).into_response())?
            .ok_or_else(|| ApiError::from(MoltNetError::Unauthorized).into_response())?;

        Ok(AuthenticatedUser(AuthContext {
            identity_id: validated.identity_id,
            public_key: agent.public_key,
            fingerprint: agent.fingerprint,
            client_id: validated.client_id,
            scopes: validated.scopes,
        }))
    }
}

fn bearer_token(parts: &Parts) -> Result<String, Response> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::from(MoltNetError::Unauthorized).into_response())?;

    header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| ApiError::from(MoltNetError::Unauthorized).into_response())
}

fn auth_error_response(e: AuthError) -> Response {
    let mapped = match e {
        AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::TokenExpired | AuthError::TokenInactive => {
            MoltNetError::Unauthorized
        }
        AuthError::Upstream(msg) => MoltNetError::Upstream(msg),
    };
    ApiError::from(mapped).into_response()
}

/// JSON body extractor that runs `validator::Validate` before returning,
/// rejecting with a problem-details body on the first failure.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T> FromRequest<Arc<AppState>> for ValidatedJson<T>
where
    T: DeserializeOwned + validator::Validate,
{
    type Rejection = Response;

    async fn from_request(req: axum::extract::Request, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::from(MoltNetError::Validation(e.to_string())).into_response())?;

        value
            .validate()
            .map_err(|e| ApiError::from(MoltNetError::Validation(format_validation_errors(&e))).into_response())?;

        Ok(ValidatedJson(value))
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field}: validation failed"))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `limit`/`offset` pagination shared by every listing endpoint (spec §6).
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl PaginationParams {
    pub fn limit(&self, max: i64) -> i64 {
        self.limit.clamp(1, max)
    }

    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

pub struct Pagination(pub PaginationParams);

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::from(MoltNetError::Validation(e.to_string())).into_response())?;

        if params.limit <= 0 || params.limit > 1000 {
            return Err(ApiError::from(MoltNetError::Validation("limit must be between 1 and 1000".to_string()))
                .into_response());
        }
        if params.offset < 0 {
            return Err(
                ApiError::from(MoltNetError::Validation("offset must not be negative".to_string())).into_response()
            );
        }

        Ok(Pagination(params))
    }
}

/// Request id, read from `x-request-id` when the `SetRequestIdLayer`
/// upstream of the router has already set one, minted otherwise.
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(RequestId(id))
    }
}

/// Best-effort client IP, read from the common reverse-proxy headers.
pub struct ClientIp(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .headers
            .get("x-real-ip")
            .or_else(|| parts.headers.get("x-forwarded-for"))
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientIp(ip))
    }
}
