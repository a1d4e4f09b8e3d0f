//! Extraction job API handlers
//!
//! POST /extract, GET /jobs, GET /jobs/:job_id

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use mixid_common::config::DEFAULT_CHUNK_DURATION;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{Job, JobStatus},
    AppState,
};

/// POST /extract request
///
/// `url` is accepted as an alias of `source_url` for older clients.
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default, alias = "url")]
    pub source_url: Option<String>,
    #[serde(default = "default_chunk_duration")]
    pub chunk_duration: u32,
}

fn default_chunk_duration() -> u32 {
    DEFAULT_CHUNK_DURATION
}

/// POST /extract response
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub job_id: Uuid,
}

/// POST /extract
///
/// Starts an extraction job in the background and returns its id right away.
/// Progress and the final tracklist are delivered on
/// `/jobs/:job_id/events`.
pub async fn start_extraction(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> ApiResult<(StatusCode, Json<ExtractResponse>)> {
    let source_url = request
        .source_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Source URL is required".to_string()))?;

    let job_id = state
        .orchestrator
        .submit(source_url, request.chunk_duration)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(ExtractResponse { job_id })))
}

/// GET /jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.orchestrator.active_jobs().await)
}

/// GET /jobs/:job_id
///
/// Running jobs and recently finished ones; a failed job carries its error.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<JobStatus>> {
    let status = state
        .orchestrator
        .get(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", job_id)))?;

    Ok(Json(status))
}

/// Build extraction routes
pub fn extract_routes() -> Router<AppState> {
    Router::new()
        .route("/extract", post(start_extraction))
        .route("/jobs", get(list_jobs))
        .route("/jobs/:job_id", get(get_job))
}
