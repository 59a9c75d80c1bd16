//! Deliberate process termination.
//!
//! `/crash` exits with status 1 and `/shutdown` with status 0, immediately,
//! without draining. The response is never written.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode};

use crate::http::server::AppState;

/// Called with the exit code. Defaults to [`std::process::exit`].
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

pub fn process_exit() -> ExitHook {
    Arc::new(|code| std::process::exit(code))
}

pub async fn crash(State(state): State<AppState>) -> StatusCode {
    tracing::warn!(exit_code = 1, "Crash requested, exiting");
    (state.exit)(1);
    StatusCode::INTERNAL_SERVER_ERROR
}

pub async fn shutdown(State(state): State<AppState>) -> StatusCode {
    tracing::warn!(exit_code = 0, "Shutdown requested, exiting");
    (state.exit)(0);
    StatusCode::OK
}
