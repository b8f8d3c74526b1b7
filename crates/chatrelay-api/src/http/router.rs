//! Axum router configuration with middleware.
//!
//! Routes mirror the boundary operations the pipeline exposes:
//! append + stream (`POST /api/send`) and retrieval (`GET /api/history`).
//! Middleware: permissive CORS and request tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/history", get(handlers::history::get_history))
        .route("/api/send", post(handlers::chat::send_message))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - liveness probe.
async fn health_check() -> &'static str {
    "ok"
}
