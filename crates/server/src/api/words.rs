//! Word generation API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use phrasebook_core::{EnqueueOptions, Job, JobStatus, ProcessingStatus, WordStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handlers::{not_found, queue_error_response, ErrorResponse};
use crate::state::AppState;

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for queueing a word. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateBody {
    /// Overrides the word's language
    pub language: Option<String>,
    /// Theme for generated sentences
    pub topic: Option<String>,
    /// Overrides the configured sentence count
    pub desired_sentence_count: Option<u32>,
}

/// Response for job lookups and enqueues
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: i64,
    pub word_id: i64,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub desired_sentence_count: u32,
    pub status: JobStatus,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub available_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            word_id: job.word_id,
            language: job.language,
            topic: job.topic,
            desired_sentence_count: job.desired_sentence_count,
            status: job.status,
            attempts: job.attempts,
            last_error: job.last_error,
            available_at: job.available_at,
            created_at: job.created_at,
            updated_at: job.updated_at,
            started_at: job.started_at,
        }
    }
}

/// Response for word status lookups
#[derive(Debug, Serialize)]
pub struct WordStatusResponse {
    pub word_id: i64,
    pub processing_status: Option<ProcessingStatus>,
    pub sentence_count: u32,
}

impl From<WordStatus> for WordStatusResponse {
    fn from(status: WordStatus) -> Self {
        Self {
            word_id: status.word_id,
            processing_status: status.processing_status,
            sentence_count: status.sentence_count,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Queue a word for sentence and audio generation
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Path(word_id): Path<i64>,
    body: Option<Json<GenerateBody>>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let options = EnqueueOptions {
        language: body.language,
        topic: body.topic,
        desired_sentence_count: body.desired_sentence_count,
    };

    let job = state
        .queue()
        .enqueue(word_id, options)
        .map_err(queue_error_response)?;

    Ok((StatusCode::ACCEPTED, Json(JobResponse::from(job))))
}

/// Get a word's processing status and sentence count
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(word_id): Path<i64>,
) -> ApiResult<Json<WordStatusResponse>> {
    match state.queue().get_status(word_id) {
        Ok(Some(status)) => Ok(Json(status.into())),
        Ok(None) => Err(not_found(format!("Word not found: {}", word_id))),
        Err(e) => Err(queue_error_response(e)),
    }
}

/// Get the generation job of a word
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(word_id): Path<i64>,
) -> ApiResult<Json<JobResponse>> {
    match state.queue().get_job(word_id) {
        Ok(Some(job)) => Ok(Json(job.into())),
        Ok(None) => Err(not_found(format!("No job for word {}", word_id))),
        Err(e) => Err(queue_error_response(e)),
    }
}
