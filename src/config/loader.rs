//! Configuration loading from disk and the environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServerConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `PORT` and `STARTUP_DELAY` overrides from the process environment.
pub fn apply_env_overrides(config: &mut ServerConfig) {
    apply_overrides(
        config,
        std::env::var("PORT").ok().as_deref(),
        std::env::var("STARTUP_DELAY").ok().as_deref(),
    );
}

fn apply_overrides(config: &mut ServerConfig, port: Option<&str>, startup_delay: Option<&str>) {
    if let Some(raw) = port {
        match raw.trim().parse::<u16>() {
            Ok(port) => set_port(config, port),
            Err(_) => tracing::warn!(value = %raw, "Ignoring invalid PORT"),
        }
    }

    if let Some(raw) = startup_delay {
        match raw.trim().parse::<u64>() {
            Ok(secs) => config.startup.delay_secs = secs,
            Err(_) => tracing::warn!(value = %raw, "Ignoring invalid STARTUP_DELAY"),
        }
    }
}

/// Replace the port of the configured bind address, keeping its host.
pub fn set_port(config: &mut ServerConfig, port: u16) {
    let mut addr = config
        .listener
        .bind_address
        .parse::<SocketAddr>()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));
    addr.set_port(port);
    config.listener.bind_address = addr.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_validates_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[listener]\nbind_address = \"127.0.0.1:9000\"\n[shutdown]\ngrace_period_secs = 2"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.shutdown.grace_period_secs, 2);
    }

    #[test]
    fn rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[shutdown]\ngrace_period_secs = 0").unwrap();

        match load_config(file.path()) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::ZeroGracePeriod])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn port_override_keeps_host() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "127.0.0.1:8080".into();
        apply_overrides(&mut config, Some("9191"), Some("3"));
        assert_eq!(config.listener.bind_address, "127.0.0.1:9191");
        assert_eq!(config.startup.delay_secs, 3);
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let mut config = ServerConfig::default();
        apply_overrides(&mut config, Some("http"), Some("-1"));
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.startup.delay_secs, 0);
    }
}
