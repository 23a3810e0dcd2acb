//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::routing::{get, post, put};
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

    let api_routes = Router::new()
        // Chat turns
        .route("/chat", post(handlers::chat::send_chat))
        .route("/chat/stream", post(handlers::chat::stream_chat))
        // Threads
        .route("/chat/threads", get(handlers::thread::list_threads))
        .route(
            "/chat/threads/{id}",
            get(handlers::thread::get_thread_history),
        )
        .route(
            "/chat/threads/{id}/title",
            put(handlers::thread::rename_thread),
        )
        // Quota status
        .route("/chat/usage", get(handlers::usage::get_usage))
        // Service stats
        .route("/stats", get(handlers::stats::get_stats));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
