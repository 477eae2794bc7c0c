//! Service probes.

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;

use super::super::AppState;

/// Health check endpoint for container orchestration.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "time": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": state.started_at.elapsed().as_secs(),
    }))
}
