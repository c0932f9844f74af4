//! Route tables, organized as nested per-resource
//! `Router<Arc<AppState>>` builders.

use std::sync::Arc;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// The full versioned REST surface (spec §6).
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/auth", auth_routes())
        .merge(oauth2_routes())
        .nest("/agents", agent_routes())
        .nest("/crypto", crypto_routes())
        .nest("/diary", diary_routes())
        .nest("/diaries", sharing_routes())
        .nest("/public", public_routes())
        .nest("/recovery", recovery_routes())
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new().route("/register", post(handlers::auth::register))
}

fn oauth2_routes() -> Router<Arc<AppState>> {
    Router::new().route("/oauth2/token", post(handlers::auth::issue_token))
}

fn agent_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/whoami", get(handlers::agents::whoami))
        .route("/{fingerprint}", get(handlers::agents::get_profile))
        .route("/{fingerprint}/verify", post(handlers::agents::verify_agent_signature))
}

fn crypto_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/verify", post(handlers::crypto::verify))
        .route("/identity", get(handlers::crypto::identity))
        .route(
            "/signing-requests",
            post(handlers::crypto::create_signing_request).get(handlers::crypto::list_signing_requests),
        )
        .route("/signing-requests/{id}", get(handlers::crypto::get_signing_request))
        .route("/signing-requests/{id}/sign", post(handlers::crypto::submit_signature))
}

fn diary_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::diary::create_diary).get(handlers::diary::list_diaries))
        .route("/entries/{entry_id}", get(handlers::diary::get_entry))
        .route("/entries/{entry_id}", patch(handlers::diary::update_entry))
        .route("/entries/{entry_id}", delete(handlers::diary::delete_entry))
        .route("/{diary_id}", get(handlers::diary::get_diary))
        .route("/{diary_id}", delete(handlers::diary::delete_diary))
        .route("/{diary_id}/visibility", put(handlers::diary::update_diary_visibility))
        .route(
            "/{diary_id}/entries",
            post(handlers::diary::create_entry).get(handlers::diary::list_entries),
        )
        .route("/{diary_id}/search", post(handlers::diary::search))
        .route("/{diary_id}/reflect", get(handlers::diary::reflect))
}

fn sharing_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{diary_id}/share", post(handlers::sharing::share_diary))
        .route("/invitations", get(handlers::sharing::list_invitations))
        .route("/invitations/{share_id}/accept", post(handlers::sharing::accept_invitation))
        .route("/invitations/{share_id}/decline", post(handlers::sharing::decline_invitation))
        .route("/invitations/{share_id}/revoke", post(handlers::sharing::revoke_invitation))
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/feed", get(handlers::public::feed))
        .route("/feed/search", get(handlers::public::search))
        .route("/entry/{id}", get(handlers::public::get_entry))
}

fn recovery_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/challenge", post(handlers::recovery::challenge))
        .route("/verify", post(handlers::recovery::verify))
}

/// Liveness/readiness probes, unversioned and unauthenticated (spec §6).
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/healthz", get(handlers::health::readiness_check))
}

/// Swagger UI, serving the OpenAPI document generated from every
/// `#[utoipa::path(...)]`-annotated handler.
pub fn swagger_routes() -> Router<Arc<AppState>> {
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    use crate::openapi::ApiDoc;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
