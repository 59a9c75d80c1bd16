//! Structured logging.
//!
//! JSON lines by default so the access log and handler logs can be shipped
//! as-is; `pretty` for local runs. `RUST_LOG` overrides the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Target of lines requested through `/log`. Enabled at every level by the
/// default filter, whatever `log_level` says.
pub const CLIENT_LOG_TARGET: &str = "client_log";

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(config: &ObservabilityConfig) -> String {
    format!(
        "debug_server={level},access_log=info,{client}=trace,interop_echo={level}",
        level = config.log_level,
        client = CLIENT_LOG_TARGET,
    )
}

/// Build the filter: `RUST_LOG` if set, otherwise the configured level.
fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(config)))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let result = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture_with_defaults(emit: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new(default_directives(&ObservabilityConfig::default())))
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(move || writer.clone()),
            );
        tracing::subscriber::with_default(subscriber, emit);
        captured.text()
    }

    #[test]
    fn client_debug_lines_pass_the_default_filter() {
        let output = capture_with_defaults(|| {
            tracing::debug!(target: CLIENT_LOG_TARGET, "client-debug-line");
            tracing::trace!(target: CLIENT_LOG_TARGET, "client-trace-line");
        });
        assert!(output.contains("client-debug-line"), "{}", output);
        assert!(output.contains("client-trace-line"), "{}", output);
    }

    #[test]
    fn log_endpoint_lines_are_emitted_at_any_level() {
        let output = capture_with_defaults(|| {
            crate::http::echo::emit_client_log("debug", "requested-debug");
            crate::http::echo::emit_client_log("verbose", "requested-unknown");
            crate::http::echo::emit_client_log("warning", "requested-warning");
        });
        for line in ["requested-debug", "requested-unknown", "requested-warning"] {
            assert!(output.contains(line), "missing {} in {}", line, output);
        }
        assert!(output.contains(r#""target":"client_log""#), "{}", output);
    }

    #[test]
    fn crate_debug_lines_follow_the_configured_level() {
        let output = capture_with_defaults(|| {
            tracing::debug!(target: "debug_server::http", "internal-debug-line");
            tracing::info!(target: "debug_server::http", "internal-info-line");
        });
        assert!(!output.contains("internal-debug-line"));
        assert!(output.contains("internal-info-line"));
    }
}
