use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::middleware::metrics_middleware;
use super::{handlers, queue, words, worker, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::<Arc<AppState>>::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Words
        .route("/words/{id}/generate", post(words::generate))
        .route("/words/{id}/status", get(words::get_status))
        .route("/words/{id}/job", get(words::get_job))
        // Queue
        .route("/queue", get(queue::get_summary))
        // Worker
        .route("/worker/status", get(worker::get_status))
        .route("/worker/start", post(worker::start))
        .route("/worker/stop", post(worker::stop))
        // Real-time updates
        .route("/ws", get(ws::ws_handler));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
