//! Diagnostic HTTP server library.

pub mod config;
pub mod http;
pub mod interop;
pub mod lifecycle;
pub mod observability;
pub mod stress;

pub use config::ServerConfig;
pub use http::{DrainOutcome, HttpServer};
pub use lifecycle::{Lifecycle, Shutdown};
