//! Liveness, readiness and system probes.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::stress::{sample_system_info, SystemInfo};

/// Liveness: always OK while the process can answer.
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// Readiness: OK until a termination signal arrives, 503 afterwards.
pub async fn readiness(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if state.lifecycle.is_terminating() {
        return Err(ApiError::Unavailable("Server is shutting down".to_string()));
    }
    Ok(Json(json!({ "status": "OK" })))
}

/// Current CPU and memory figures.
pub async fn system_info() -> Result<Json<SystemInfo>, ApiError> {
    tokio::task::spawn_blocking(sample_system_info)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal(format!("Failed to sample system info: {}", e)))
}
