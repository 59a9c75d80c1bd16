//! Telemetry middleware.
//!
//! Wraps every route. Records the start time, delegates, then builds one
//! [`LogEntry`] from the request and the response the handler produced and
//! hands it to the configured sink. It only observes: headers and body pass
//! through untouched, and handler errors are already responses by the time
//! they reach it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::observability::access_log::{
    flatten_headers, AccessLogSink, LogEntry, RequestDetails, ResponseDetails,
};
use crate::observability::metrics;

/// State for the telemetry middleware.
#[derive(Clone)]
pub struct TelemetryState {
    pub sink: Arc<dyn AccessLogSink>,
}

pub async fn telemetry_middleware(
    State(state): State<TelemetryState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();

    let request_details = RequestDetails {
        method: request.method().to_string(),
        url: request.uri().to_string(),
        headers: flatten_headers(request.headers()),
        body: None,
    };
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();

    let response = next.run(request).await;
    let latency = start.elapsed().as_secs_f64();

    let entry = LogEntry {
        request: request_details,
        response: ResponseDetails {
            headers: flatten_headers(response.headers()),
            status_code: response.status().as_u16(),
            latency,
            client_ip,
            body: None,
        },
    };

    metrics::record_request(&entry.request.method, entry.response.status_code, latency);
    state.sink.emit(&entry);

    response
}
