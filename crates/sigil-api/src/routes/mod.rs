//! Route table and router assembly.
//!
//! Public routes (health, login, registration) sit outside the auth layer;
//! everything under `/api` otherwise requires a validated bearer token.

pub mod admins;
pub mod auth;
pub mod history;
pub mod holders;
pub mod numbers;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use sigil_auth::AuthLayer;

use crate::state::AppState;
use crate::validator::StoreTokenValidator;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let validator = Arc::new(StoreTokenValidator::new(
        state.store.clone(),
        state.signer.clone(),
    ));

    let public = Router::new()
        .route("/health", get(health))
        .route("/api/token", post(auth::login))
        .route("/api/register", post(auth::register));

    let protected = Router::new()
        .route("/api/users/me", get(auth::me))
        .route("/api/invite", post(admins::invite))
        .route("/api/admins/", get(admins::list))
        .route("/api/holders/", get(holders::list).post(holders::create))
        .route(
            "/api/holders/{holder_id}",
            get(holders::fetch).put(holders::update).delete(holders::remove),
        )
        .route("/api/numbers/", get(numbers::list).post(numbers::create))
        .route(
            "/api/holders/{holder_id}/numbers/{number_id}/link",
            post(numbers::link),
        )
        .route(
            "/api/holders/{holder_id}/numbers/{number_id}/unlink",
            post(numbers::unlink),
        )
        .route("/api/history/", get(history::list))
        .route_layer(AuthLayer::new(validator));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /health` — liveness plus lifecycle state.
///
/// Returns 503 until the server reaches an available state so load
/// balancers hold traffic during startup and shutdown.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let lifecycle = state.service.state();
    let status = if lifecycle.is_available() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = serde_json::json!({
        "status": if lifecycle.is_available() { "ok" } else { "unavailable" },
        "state": lifecycle.to_string(),
        "uptime_secs": state.service.uptime().as_secs(),
    });
    (status, Json(body))
}
