//! MoltNet API (C13): the REST surface in front of every orchestrator and
//! service crate. Routing, request/response shapes, and RFC 9457 error
//! mapping live here; every domain decision stays in the crate that owns
//! it. Organized as a `routes`/`handlers`/`extractors`/`state`/`error`
//! module split.

pub mod cursor;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::body::Body;
use axum::extract::Request;
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Runtime knobs for the router's cross-cutting middleware, layered over
/// `AppState`'s domain wiring.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub enable_compression: bool,
    pub enable_tracing: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            enable_compression: true,
            enable_tracing: true,
        }
    }
}

/// Assemble the full application router: versioned REST API, Swagger UI,
/// and health endpoints, wrapped in the middleware stack `api_config`
/// selects.
pub fn create_router(state: std::sync::Arc<AppState>, api_config: ApiConfig) -> Router {
    let mut router = Router::new()
        .merge(routes::api_routes())
        .merge(routes::swagger_routes())
        .merge(routes::health_routes())
        .with_state(state);

    if api_config.enable_tracing {
        router = router.layer(TraceLayer::new_for_http());
    }

    if api_config.enable_compression {
        router = router.layer(CompressionLayer::new());
    }

    if api_config.enable_cors {
        let cors = if api_config.cors_origins.iter().any(|o| o == "*") {
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        } else {
            let origins: Vec<_> = api_config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
        };
        router = router.layer(cors);
    }

    router
        .layer(middleware::from_fn(tag_problem_instance))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Stamps the RFC 9457 `instance` member of any `application/problem+json`
/// response with the path that produced it. `ApiError` has no access to
/// the request URI when it's built deep inside a handler, so this runs as
/// an outer layer instead, rewriting the already-serialized body.
async fn tag_problem_instance(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let is_problem_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/problem+json"));

    if !is_problem_json {
        return response;
    }

    let (parts, body) = response.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, usize::MAX).await else {
        return Response::from_parts(parts, Body::empty());
    };

    let rewritten = serde_json::from_slice::<serde_json::Value>(&bytes).ok().and_then(|mut value| {
        let obj = value.as_object_mut()?;
        obj.insert("instance".to_string(), serde_json::Value::String(path));
        serde_json::to_vec(&value).ok()
    });

    Response::from_parts(parts, Body::from(rewritten.unwrap_or_else(|| bytes.to_vec())))
}
