//! Worker control API handlers.

use axum::{extract::State, http::StatusCode, Json};
use phrasebook_core::WorkerStatus;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Get worker status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<WorkerStatus> {
    Json(state.worker().status().await)
}

/// Start the worker
pub async fn start(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.worker().start().await {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Worker started".to_string(),
        })),
        Err(e) => {
            error!("Failed to start worker: {}", e);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Stop the worker, waiting for the current job to finish
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    state.worker().stop().await;
    Json(MessageResponse {
        message: "Worker stopped".to_string(),
    })
}
