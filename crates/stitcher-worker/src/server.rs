//! HTTP adapter around [`Pipeline::handle_event`].

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use stitcher_models::PipelineResult;

use crate::pipeline::Pipeline;

/// Events are small JSON documents; media never travels in the body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the worker router.
pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/run", post(run_job))
        .route("/runsync", post(run_job))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

/// Run one job to completion. Handled failures are still HTTP 200.
pub async fn run_job(
    State(pipeline): State<Arc<Pipeline>>,
    Json(event): Json<serde_json::Value>,
) -> Json<PipelineResult> {
    Json(pipeline.handle_event(event).await)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
