//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, body limits)
//!     → middleware/telemetry.rs (one access record per request)
//!     → handler:
//!         probes.rs     /healthz /readiness /system-info
//!         echo.rs       /debug /log /custom-headers /stateless /reset
//!         content.rs    /html /xml
//!         relay.rs      /proxy /proxy-http-bin
//!         files.rs      /upload /download
//!         websocket.rs  /websocket
//!         sse.rs        /sse
//!         stress.rs     /stress/cpu /stress/memory
//!         process.rs    /crash /shutdown
//!     → streams.rs (open WebSocket/SSE count)
//!     → error.rs (ApiError → status + message)
//! ```

pub mod content;
pub mod echo;
pub mod error;
pub mod files;
pub mod middleware;
pub mod probes;
pub mod process;
pub mod relay;
pub mod server;
pub mod sse;
pub mod streams;
pub mod stress;
pub mod websocket;

pub use error::ApiError;
pub use process::ExitHook;
pub use server::{AppState, DrainOutcome, HttpServer, ServerError};
pub use streams::{ActiveStreams, StreamKind};
