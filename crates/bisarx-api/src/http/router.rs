//! Axum router configuration with middleware.
//!
//! Middleware: CORS, tracing, and a per-IP rate limit on `POST /chat`.

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::rate_limit;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let chat_routes = Router::new()
        .route("/chat", post(handlers::chat::send_chat))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_chat,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        // Auth
        .route("/api/register", post(handlers::auth::register))
        .route("/api/register/", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        // Chat
        .merge(chat_routes)
        .route("/chat/history", get(handlers::chat::chat_history))
        // Sessions
        .route("/sessions", get(handlers::session::list_sessions))
        .route("/sessions/", get(handlers::session::list_sessions))
        // Feedback
        .route(
            "/messages/{id}/feedback",
            post(handlers::feedback::submit_feedback),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - Liveness banner.
async fn root() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "Status": "We are working perfectly" }))
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
