//! Search-and-evaluate endpoint.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::super::{ApiError, AppState};
use crate::services::{SearchQuery, SearchResponse};
use crate::utils::cancel::cancel_after;

/// Search blog posts and judge each hit.
///
/// Everything started for the request hangs off one cancellation token. It
/// fires when the deadline passes or when the client goes away and axum drops
/// this future.
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    query.validate().map_err(ApiError::Validation)?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    cancel_after(&cancel, state.request_timeout);

    info!(
        "Search '{}' limit={} offset={}",
        query.query.trim(),
        query.limit(),
        query.offset()
    );
    let response = state.search.search(&query, &cancel).await?;
    Ok(Json(response))
}
