//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → HttpServer stops accepting → drain → Stopped
//!
//! State (state.rs):
//!     Running → Draining → Stopped, read by the readiness probe
//! ```
//!
//! # Design Decisions
//! - The terminating flag is an atomic that is set once and never cleared
//! - Shutdown has a deadline: connections still open afterwards are cut
//! - A bind failure exits the process without ever entering Draining

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::termination_signal;
pub use state::{Lifecycle, Phase};
