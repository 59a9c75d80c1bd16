//! Configuration schema definitions.
//!
//! Every section derives Serde traits and defaults each field, so an empty
//! TOML file (or no file at all) yields a runnable server.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the diagnostic server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Graceful drain settings.
    pub shutdown: ShutdownConfig,

    /// Startup behaviour.
    pub startup: StartupConfig,

    /// Upload storage.
    pub uploads: UploadConfig,

    /// Upstream relay settings.
    pub upstream: UpstreamConfig,

    /// WebSocket and SSE settings.
    pub streaming: StreamingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time in-flight requests get to finish once draining starts.
    pub grace_period_secs: u64,
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 5,
        }
    }
}

/// Startup configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StartupConfig {
    /// Seconds to wait before binding the listener.
    pub delay_secs: u64,
}

/// Upload storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory uploaded files are written to.
    pub directory: PathBuf,

    /// Maximum accepted request body for `/upload`, in bytes.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            directory: std::env::temp_dir(),
            max_bytes: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Upstream relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Target of `/proxy-http-bin`.
    pub http_bin_url: String,

    /// Total request timeout for relayed calls, in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            http_bin_url: "http://httpbin.org/anything".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Streaming endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Interval between server-sent events, in milliseconds.
    pub sse_interval_ms: u64,

    /// Prefix prepended to every echoed WebSocket message.
    pub websocket_echo_prefix: String,
}

impl StreamingConfig {
    pub fn sse_interval(&self) -> Duration {
        Duration::from_millis(self.sse_interval_ms)
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            sse_interval_ms: 1000,
            websocket_echo_prefix: "Echo: ".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable output for local runs.
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.shutdown.grace_period(), Duration::from_secs(5));
        assert_eq!(config.streaming.sse_interval(), Duration::from_secs(1));
        assert_eq!(config.streaming.websocket_echo_prefix, "Echo: ");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [streaming]
            sse_interval_ms = 250

            [observability]
            log_format = "pretty"
            "#,
        )
        .unwrap();
        assert_eq!(config.streaming.sse_interval_ms, 250);
        assert_eq!(config.streaming.websocket_echo_prefix, "Echo: ");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert_eq!(config.observability.log_level, "info");
    }
}
