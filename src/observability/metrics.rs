//! Metrics collection and exposition.
//!
//! # Metrics
//! - `debug_server_requests_total` (counter): requests by method, status
//! - `debug_server_request_duration_seconds` (histogram): latency by method
//! - `debug_server_open_streams` (gauge): live WebSocket/SSE connections
//! - `debug_server_stress_jobs_total` (counter): stress jobs started by kind
//!
//! Recording goes through the `metrics` facade and is a no-op until
//! [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, latency_secs: f64) {
    metrics::counter!(
        "debug_server_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "debug_server_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(latency_secs);
}

pub fn stream_opened(kind: &'static str) {
    metrics::gauge!("debug_server_open_streams", "kind" => kind).increment(1.0);
}

pub fn stream_closed(kind: &'static str) {
    metrics::gauge!("debug_server_open_streams", "kind" => kind).decrement(1.0);
}

pub fn record_stress_job(kind: &'static str) {
    metrics::counter!("debug_server_stress_jobs_total", "kind" => kind).increment(1);
}
