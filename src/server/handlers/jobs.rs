//! Background OCR job lookups.

use axum::{
    extract::{Path, State},
    Json,
};

use super::super::{ApiError, AppState};
use crate::models::{JobVerdict, OcrResult};

/// Current state of a background OCR job.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobVerdict>, ApiError> {
    state
        .repository
        .get_job(&job_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("job {} not found", job_id)))
}

/// Per-image OCR results recorded for a job, oldest first.
pub async fn job_results(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<OcrResult>>, ApiError> {
    if state.repository.get_job(&job_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("job {} not found", job_id)));
    }
    Ok(Json(state.repository.results_for_job(&job_id).await?))
}
