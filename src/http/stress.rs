//! `/stress/cpu` and `/stress/memory`.
//!
//! Parameters are validated before anything is spawned; the response is sent
//! as soon as the job is detached.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::stress::{StressKind, StressParams};

fn start(
    state: &AppState,
    kind: StressKind,
    query: &HashMap<String, String>,
    percent_key: &str,
) -> Result<Json<Value>, ApiError> {
    let params = StressParams::parse(
        kind,
        query.get(percent_key).map(String::as_str),
        query.get("duration").map(String::as_str),
    )?;
    let message = params.describe();
    state.stress.launch(params);
    Ok(Json(json!({ "message": message })))
}

pub async fn stress_cpu(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    start(&state, StressKind::Cpu, &query, "cpu_percent")
}

pub async fn stress_memory(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    start(&state, StressKind::Memory, &query, "memory_percent")
}
