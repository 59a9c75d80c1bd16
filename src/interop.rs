//! Minimal interop service.
//!
//! A second, independent listener answering `/healthz` and `/echo` with a
//! service tag, so health aggregators can compare implementations side by
//! side. Shares nothing with the diagnostic server.

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

/// Tag reported in every response.
pub const SERVICE_NAME: &str = "rust";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8086;

pub fn router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/echo", post(echo))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

async fn echo(body: Bytes) -> Response {
    match serde_json::from_slice::<Value>(&body) {
        Ok(data) => Json(json!({ "service": SERVICE_NAME, "echo": data })).into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected echo body");
            (StatusCode::BAD_REQUEST, "Invalid JSON").into_response()
        }
    }
}
