//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::services::ServeDir;

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.settings.uploads.dir);

    Router::new()
        // WebSocket gateway endpoint
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/test", get(smoke_test))
        .merge(auth_routes())
        .route("/people", get(handlers::user::list_people))
        .route("/messages/{user_id}", get(handlers::message::history))
        // Attachments written by the content store
        .nest_service("/uploads", uploads)
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/profile", get(handlers::auth::profile))
}

async fn smoke_test() -> Json<&'static str> {
    Json("Test ok")
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}
