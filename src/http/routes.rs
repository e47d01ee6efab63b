use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Presentation snapshot
        .route("/snapshot", get(handlers::get_snapshot))
        // Recording control
        .route("/recording", get(handlers::get_recording))
        .route("/recording/start", post(handlers::start_recording))
        .route("/recording/stop", post(handlers::stop_recording))
        .route("/recording/cancel", post(handlers::cancel_recording))
        .route("/recording/acknowledge", post(handlers::acknowledge_failure))
        .route("/recording/decision", post(handlers::decide))
        .route("/playback/stop", post(handlers::stop_playback))
        // Typed input
        .route("/messages", post(handlers::send_message))
        // The UI shell may be served from another origin (webview, dev server)
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
