//! Upstream relays.
//!
//! `/proxy` forwards a caller-described request and reports what came back.
//! `/proxy-http-bin` streams a fixed upstream body through. No retries.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::TryStreamExt;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::http::echo::multi_headers;
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Body of a `/proxy` call.
#[derive(Debug, Deserialize)]
pub struct ProxyRequest {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
}

impl ProxyRequest {
    fn target(&self) -> Result<(reqwest::Method, url::Url), ApiError> {
        let method = reqwest::Method::from_bytes(self.method.as_bytes())
            .map_err(|e| ApiError::bad_request(format!("Invalid method `{}`: {}", self.method, e)))?;
        let url = url::Url::parse(&self.url)
            .map_err(|e| ApiError::bad_request(format!("Invalid url `{}`: {}", self.url, e)))?;
        Ok((method, url))
    }
}

/// Forward the described request and echo the upstream headers and body.
///
/// Any failure, including an unreachable upstream, is reported as 400
/// since the target was chosen by the caller.
pub async fn proxy(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: ProxyRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let (method, url) = request.target()?;

    tracing::debug!(method = %method, url = %url, "Relaying request");

    let mut upstream = state.client.request(method, url);
    if let Some(payload) = &request.payload {
        upstream = upstream.json(payload);
    }
    let upstream = upstream
        .send()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let headers = multi_headers(upstream.headers());
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let body = serde_json::from_slice::<Value>(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    Ok(Json(json!({
        "response": {
            "headers": headers,
            "body": body,
        }
    }))
    .into_response())
}

/// Stream the configured upstream's body through as JSON.
pub async fn proxy_http_bin(State(state): State<AppState>) -> Result<Response, ApiError> {
    let url = &state.config.upstream.http_bin_url;
    let upstream = state
        .client
        .get(url)
        .send()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let stream = upstream.bytes_stream().map_err(std::io::Error::other);
    let mut response = Body::from_stream(stream).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(response)
}
