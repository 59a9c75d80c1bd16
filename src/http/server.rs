//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Build the Axum router with every handler
//! - Wire up middleware (request ID, telemetry, upload body limit)
//! - Serve on the given listener with connection info
//! - Drain in-flight requests on shutdown, bounded by the grace period

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{any, get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
};

use crate::config::ServerConfig;
use crate::http::error::{method_not_allowed, not_found};
use crate::http::files::UploadSlot;
use crate::http::middleware::{telemetry_middleware, TelemetryState};
use crate::http::process::{process_exit, ExitHook};
use crate::http::streams::ActiveStreams;
use crate::http::{content, echo, files, probes, process, relay, sse, stress, websocket};
use crate::lifecycle::{Lifecycle, ShutdownListener};
use crate::observability::{AccessLogSink, TracingSink};
use crate::stress::StressLauncher;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub lifecycle: Arc<Lifecycle>,
    pub uploads: Arc<UploadSlot>,
    pub stress: Arc<StressLauncher>,
    pub streams: Arc<ActiveStreams>,
    /// Outbound client for the relays.
    pub client: reqwest::Client,
    pub exit: ExitHook,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How the drain after a shutdown signal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight request finished within the grace period.
    Completed,
    /// The grace period expired with requests still open.
    ForcedClose,
}

/// The diagnostic HTTP server.
pub struct HttpServer {
    state: AppState,
    sink: Arc<dyn AccessLogSink>,
}

impl HttpServer {
    /// Create a server for `config`. Access records go to the tracing sink
    /// and `/crash`/`/shutdown` exit the process until overridden.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream.timeout_secs))
            .build()?;

        let state = AppState {
            config: Arc::new(config),
            lifecycle: Arc::new(Lifecycle::new()),
            uploads: Arc::new(UploadSlot::new()),
            stress: Arc::new(StressLauncher::new()),
            streams: Arc::new(ActiveStreams::new()),
            client,
            exit: process_exit(),
        };

        Ok(Self {
            state,
            sink: Arc::new(TracingSink),
        })
    }

    pub fn with_access_log(mut self, sink: Arc<dyn AccessLogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_exit_hook(mut self, exit: ExitHook) -> Self {
        self.state.exit = exit;
        self
    }

    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        self.state.lifecycle.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let telemetry = TelemetryState {
            sink: self.sink.clone(),
        };
        let upload_limit = self.state.config.uploads.max_bytes;

        Router::new()
            .route("/healthz", get(probes::healthz).fallback(method_not_allowed))
            .route("/readiness", get(probes::readiness).fallback(method_not_allowed))
            .route("/system-info", get(probes::system_info).fallback(method_not_allowed))
            .route("/debug", post(echo::debug).fallback(method_not_allowed))
            .route("/log", post(echo::log).fallback(method_not_allowed))
            .route("/custom-headers", post(echo::custom_headers).fallback(method_not_allowed))
            .route("/stateless", get(echo::stateless).fallback(method_not_allowed))
            .route("/reset", get(echo::reset).fallback(method_not_allowed))
            .route("/html", get(content::html).fallback(method_not_allowed))
            .route("/xml", get(content::xml).fallback(method_not_allowed))
            .route("/proxy", post(relay::proxy).fallback(method_not_allowed))
            .route("/proxy-http-bin", get(relay::proxy_http_bin).fallback(method_not_allowed))
            .route(
                "/upload",
                post(files::upload)
                    .fallback(method_not_allowed)
                    .layer::<_, std::convert::Infallible>(DefaultBodyLimit::disable())
                    .layer(RequestBodyLimitLayer::new(upload_limit)),
            )
            .route("/download", get(files::download).fallback(method_not_allowed))
            .route("/websocket", get(websocket::websocket).fallback(method_not_allowed))
            .route("/sse", get(sse::sse).fallback(method_not_allowed))
            .route("/crash", any(process::crash))
            .route("/shutdown", any(process::shutdown))
            .route("/stress/cpu", get(stress::stress_cpu).fallback(method_not_allowed))
            .route("/stress/memory", get(stress::stress_memory).fallback(method_not_allowed))
            .fallback(not_found)
            .with_state(self.state.clone())
            .layer(middleware::from_fn_with_state(telemetry, telemetry_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve until `shutdown` fires, then drain.
    ///
    /// The drain is bounded by `shutdown.grace_period_secs`; past it the
    /// serve future is dropped and `ForcedClose` is returned. Connection
    /// tasks still running at that point end when the runtime shuts down.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownListener,
    ) -> Result<DrainOutcome, ServerError> {
        let addr = listener.local_addr()?;
        let lifecycle = self.state.lifecycle.clone();
        let grace = self.state.config.shutdown.grace_period();

        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();
        let signalled = lifecycle.clone();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                if signalled.begin_draining() {
                    tracing::info!(
                        grace_period_secs = grace.as_secs(),
                        "Shutdown signal received, draining connections"
                    );
                }
            })
            .into_future();
        tokio::pin!(serve);

        let deadline = async {
            lifecycle.draining().await;
            tokio::time::sleep(grace).await;
        };

        let outcome = tokio::select! {
            result = &mut serve => {
                result?;
                DrainOutcome::Completed
            }
            _ = deadline => {
                tracing::warn!(
                    grace_period_secs = grace.as_secs(),
                    "Grace period expired, closing remaining connections"
                );
                DrainOutcome::ForcedClose
            }
        };

        lifecycle.mark_stopped();
        tracing::info!(outcome = ?outcome, "HTTP server stopped");
        Ok(outcome)
    }
}
