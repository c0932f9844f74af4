//! Liveness and readiness probes (§6 `GET /health`, `GET /healthz`),
//! built as a `HealthResponse`/`ReadinessResponse`/`ComponentStatus`
//! shape, extended
//! to report the workflow engine and relationship engine alongside
//! Postgres itself — both are backed by the same connection pool, so a
//! single `SELECT 1` covers all three.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub status: String,
    pub database: ComponentStatus,
    pub workflow_engine: ComponentStatus,
    pub relationship_engine: ComponentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentStatus {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /health`: process is up, nothing more.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is running", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy".to_string(), version: env!("CARGO_PKG_VERSION").to_string() })
}

/// `GET /healthz`: liveness plus a dependency probe.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Health",
    responses(
        (status = 200, description = "Service and dependencies are healthy", body = ReadinessResponse),
        (status = 503, description = "A dependency is unreachable", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadinessResponse>) {
    let pg_ok = match state.db.health_check().await {
        Ok(health) => health.postgres,
        Err(_) => false,
    };

    let component = |name: &str, ok: bool| ComponentStatus {
        name: name.to_string(),
        status: if ok { "healthy".to_string() } else { "unhealthy".to_string() },
        error: if ok { None } else { Some(format!("{name} unreachable via Postgres pool")) },
    };

    let status_code = if pg_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status_code,
        Json(ReadinessResponse {
            status: if pg_ok { "ready".to_string() } else { "not_ready".to_string() },
            database: component("PostgreSQL", pg_ok),
            workflow_engine: component("workflow engine", pg_ok),
            relationship_engine: component("relationship engine", pg_ok),
        }),
    )
}
