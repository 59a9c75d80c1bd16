//! Configuration validation.
//!
//! Semantic checks that serde cannot express. All problems are collected
//! and returned together.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("shutdown.grace_period_secs must be greater than zero")]
    ZeroGracePeriod,

    #[error("streaming.sse_interval_ms must be greater than zero")]
    ZeroSseInterval,

    #[error("uploads.max_bytes must be greater than zero")]
    ZeroUploadLimit,

    #[error("upstream.http_bin_url `{0}` is not a valid URL")]
    UpstreamUrl(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.shutdown.grace_period_secs == 0 {
        errors.push(ValidationError::ZeroGracePeriod);
    }
    if config.streaming.sse_interval_ms == 0 {
        errors.push(ValidationError::ZeroSseInterval);
    }
    if config.uploads.max_bytes == 0 {
        errors.push(ValidationError::ZeroUploadLimit);
    }
    if url::Url::parse(&config.upstream.http_bin_url).is_err() {
        errors.push(ValidationError::UpstreamUrl(config.upstream.http_bin_url.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
