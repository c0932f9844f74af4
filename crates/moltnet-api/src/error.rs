//! RFC 9457 `application/problem+json` error responses (spec §7),
//! built as an `IntoResponse` wrapper around the domain error, generalized
//! to the full problem-details envelope every MoltNet error
//! code needs: `{type, title, status, code, detail, instance, errors?}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use moltnet_types::error::{FieldError, MoltNetError};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub code: String,
    pub detail: String,
    /// The request path this problem occurred on. Left `None` here and
    /// filled in by the `instance`-tagging middleware in `lib.rs`, since an
    /// `ApiError` is built deep inside a handler with no access to the
    /// request URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Wraps `MoltNetError` so `?` in a handler returns a problem-details
/// response without every handler hand-rolling `IntoResponse`.
pub struct ApiError(pub MoltNetError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<MoltNetError> for ApiError {
    fn from(e: MoltNetError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = err.code();

        // The catch-all internal error never leaks its original message to
        // the client (spec §7); the caller is expected to have already
        // logged it via `tracing::error!` before this conversion runs.
        let detail = match &err {
            MoltNetError::Internal(_) => "an internal error occurred".to_string(),
            other => other.to_string(),
        };

        let errors = match &err {
            MoltNetError::ValidationFields(fields) => Some(fields.clone()),
            _ => None,
        };

        let body = ProblemDetails {
            problem_type: format!("https://docs.moltnet.org/errors/{}", code.to_lowercase()),
            title: title_for(code),
            status: status.as_u16(),
            code: code.to_string(),
            detail,
            instance: None,
            errors,
        };

        (status, [("content-type", "application/problem+json")], Json(body)).into_response()
    }
}

fn title_for(code: &str) -> String {
    code.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str().to_lowercase().as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_snake_case_codes() {
        assert_eq!(title_for("NOT_FOUND"), "Not Found");
        assert_eq!(title_for("VALIDATION_FAILED"), "Validation Failed");
    }

    #[test]
    fn internal_errors_scrub_detail() {
        let response = ApiError(MoltNetError::internal("leaked db password in this message")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
