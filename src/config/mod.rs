//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → env overrides (PORT, STARTUP_DELAY) and CLI flags
//!     → ServerConfig (immutable, shared via AppState)
//! ```
//!
//! # Design Decisions
//! - Every field has a default; the server runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks
//! - Request behaviour is driven by query parameters, not config

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, set_port, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, ServerConfig, ShutdownConfig,
    StartupConfig, StreamingConfig, UploadConfig, UpstreamConfig,
};
