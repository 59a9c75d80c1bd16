//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request:
//!     → http::middleware::telemetry builds a LogEntry
//!     → access_log.rs sink (one JSON line per request)
//!     → metrics.rs (request counter + latency histogram)
//!
//! Handlers, streams, stress jobs:
//!     → tracing events (logging.rs subscriber)
//!     → metrics.rs gauges/counters
//! ```

pub mod access_log;
pub mod logging;
pub mod metrics;

pub use access_log::{AccessLogSink, LogEntry, MemorySink, RequestDetails, ResponseDetails, TracingSink};
