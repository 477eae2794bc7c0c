//! Router configuration for the web server.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(handlers::search))
        .route("/api/v1/search", get(handlers::search))
        // Background OCR jobs
        .route("/ocr/:job_id", get(handlers::job_status))
        .route("/ocr/:job_id/results", get(handlers::job_results))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
