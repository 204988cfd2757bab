//! Queue summary API handler.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use phrasebook_core::QueueSummary;
use serde::Deserialize;
use std::sync::Arc;

use super::handlers::{queue_error_response, ErrorResponse};
use crate::state::AppState;

/// Query parameters for the queue summary
#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    /// Only count jobs in this language
    pub language: Option<String>,
}

/// Counts per status plus queued and in-flight words
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<QueueSummary>, (StatusCode, Json<ErrorResponse>)> {
    state
        .queue()
        .get_queue_summary(params.language.as_deref())
        .map(Json)
        .map_err(queue_error_response)
}
