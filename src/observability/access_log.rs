//! Per-request access log records.
//!
//! One [`LogEntry`] is built by the telemetry middleware for every request
//! and handed to an [`AccessLogSink`]. The production sink writes it as a
//! single JSON line through `tracing`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;
use serde::Serialize;

/// Target used for access log events, so they can be filtered separately.
pub const ACCESS_LOG_TARGET: &str = "access_log";

/// Complete record of one request/response exchange.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LogEntry {
    pub request: RequestDetails,
    pub response: ResponseDetails,
}

/// What the client sent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestDetails {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// What the server answered.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseDetails {
    pub headers: BTreeMap<String, String>,
    pub status_code: u16,
    /// Seconds from middleware entry to handler completion.
    pub latency: f64,
    pub client_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// Flatten a header map into name → value.
///
/// Repeated names keep the last value. Non-UTF-8 values are rendered lossily.
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    for (name, value) in headers {
        flat.insert(
            name.as_str().to_string(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    flat
}

/// Destination for access log records.
pub trait AccessLogSink: Send + Sync {
    fn emit(&self, entry: &LogEntry);
}

/// Writes each entry as one INFO event whose message is the JSON record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AccessLogSink for TracingSink {
    fn emit(&self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(line) => tracing::info!(target: ACCESS_LOG_TARGET, "{}", line),
            Err(e) => tracing::error!(error = %e, "Failed to serialize access log entry"),
        }
    }
}

/// Keeps every entry in memory. Used by tests and tooling.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the entries recorded so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AccessLogSink for MemorySink {
    fn emit(&self, entry: &LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}
