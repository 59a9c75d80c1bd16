//! Request echo and header utilities.
//!
//! `/debug`, `/log`, `/custom-headers`, `/stateless`, `/reset`. All of them
//! are stateless; the only suspension point is the optional delay.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Query, Request},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::observability::logging::CLIENT_LOG_TARGET;

/// Largest request body `/debug` will echo back.
const ECHO_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Header map as name → every value, in arrival order.
pub(crate) fn multi_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        out.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    out
}

/// Parse a whole number of seconds, ignoring anything that is not one.
fn delay_from(raw: Option<&str>) -> Option<Duration> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Body as JSON if it parses, raw text otherwise, nothing if empty.
fn body_value(bytes: &Bytes) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    Some(
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    )
}

/// Boolean query values in the usual `strconv`-style spellings.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Final status requested through `status_code`.
///
/// Informational codes cannot be sent as a final response, so anything
/// outside 200–999 falls back to 200.
fn status_override(raw: Option<&str>) -> StatusCode {
    raw.and_then(|raw| raw.trim().parse::<u16>().ok())
        .filter(|code| (200..=999).contains(code))
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK)
}

#[derive(Debug, Default, Deserialize)]
pub struct DebugQuery {
    seconds: Option<String>,
    status_code: Option<String>,
}

/// Echo the request after an optional delay, with an optional status override.
pub async fn debug(Query(query): Query<DebugQuery>, request: Request) -> Result<Response, ApiError> {
    if let Some(delay) = delay_from(query.seconds.as_deref()) {
        tracing::debug!(delay_secs = delay.as_secs(), "Delaying debug response");
        tokio::time::sleep(delay).await;
    }

    let status = status_override(query.status_code.as_deref());

    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, ECHO_BODY_LIMIT)
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read body: {}", e)))?;

    let mut echo = json!({
        "headers": multi_headers(&parts.headers),
        "method": parts.method.as_str(),
        "url": parts.uri.to_string(),
        "remote_addr": remote_addr,
    });
    if let Some(body) = body_value(&bytes) {
        echo["body"] = body;
    }

    Ok((status, Json(echo)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    message: String,
    #[serde(default)]
    level: String,
}

/// Emit a caller-supplied log line at the requested level.
pub async fn log(Query(query): Query<LogQuery>) -> Json<Value> {
    emit_client_log(&query.level, &query.message);
    Json(json!({ "message": query.message, "level": query.level }))
}

/// Unknown levels fall back to debug.
pub(crate) fn emit_client_log(level: &str, message: &str) {
    match level {
        "info" => tracing::info!(target: CLIENT_LOG_TARGET, "{}", message),
        "warning" => tracing::warn!(target: CLIENT_LOG_TARGET, "{}", message),
        "error" => tracing::error!(target: CLIENT_LOG_TARGET, "{}", message),
        _ => tracing::debug!(target: CLIENT_LOG_TARGET, requested_level = level, "{}", message),
    }
}

/// Set every header named in the JSON body on an empty 200 response.
pub async fn custom_headers(body: Bytes) -> Result<Response, ApiError> {
    let requested: HashMap<String, String> =
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let mut response = Response::new(Body::empty());
    for (name, value) in requested {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::bad_request(format!("Invalid header name `{}`: {}", name, e)))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|e| ApiError::bad_request(format!("Invalid value for `{}`: {}", name, e)))?;
        response.headers_mut().insert(name, value);
    }
    Ok(response)
}

#[derive(Debug, Default, Deserialize)]
pub struct SecondsQuery {
    seconds: Option<String>,
}

/// Delay, then answer and ask the client to close the connection.
pub async fn stateless(Query(query): Query<SecondsQuery>) -> impl IntoResponse {
    if let Some(delay) = delay_from(query.seconds.as_deref()) {
        tokio::time::sleep(delay).await;
    }
    (
        [(header::CONNECTION, HeaderValue::from_static("close"))],
        Json(json!({ "status": "OK" })),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    #[serde(rename = "do")]
    perform: Option<String>,
}

/// With `do=true`, close the connection after this response.
pub async fn reset(Query(query): Query<ResetQuery>) -> Response {
    let perform = query
        .perform
        .as_deref()
        .and_then(parse_bool)
        .unwrap_or(false);

    if perform {
        tracing::info!("Resetting client connection");
        return (
            [(header::CONNECTION, HeaderValue::from_static("close"))],
            "Connection will be reset",
        )
            .into_response();
    }
    Json(json!({ "message": "Reset not performed" })).into_response()
}
