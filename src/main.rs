//! Diagnostic HTTP server.
//!
//! A controllable endpoint surface for exercising proxies, load balancers,
//! health checks and resiliency tooling.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                  DEBUG SERVER                    │
//!                    │                                                  │
//!  Client Request    │  ┌──────────┐   ┌───────────┐   ┌────────────┐  │
//!  ──────────────────┼─▶│ listener │──▶│ telemetry │──▶│  handlers  │  │
//!                    │  └──────────┘   └───────────┘   └─────┬──────┘  │
//!                    │                                       │         │
//!                    │        ┌──────────────┬───────────────┼──────┐  │
//!                    │        ▼              ▼               ▼      │  │
//!                    │  ┌──────────┐  ┌──────────────┐ ┌─────────┐  │  │
//!                    │  │ ws / sse │  │ stress jobs  │ │ uploads │  │  │
//!                    │  └──────────┘  └──────────────┘ └─────────┘  │  │
//!                    │                                              │  │
//!                    │  ┌────────────────────────────────────────┐  │  │
//!                    │  │ lifecycle: Running → Draining → Stopped │◀─┘  │
//!                    │  └────────────────────────────────────────┘     │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use debug_server::config::{apply_env_overrides, load_config, set_port, ServerConfig};
use debug_server::http::{DrainOutcome, HttpServer};
use debug_server::lifecycle::Shutdown;
use debug_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "debug-server")]
#[command(about = "Diagnostic HTTP server for proxy and infrastructure testing", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "DEBUG_SERVER_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port, overriding the configuration and `PORT`.
    #[arg(short, long)]
    port: Option<u16>,
}

/// How long runtime teardown waits for leftover blocking tasks.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration from {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };
    apply_env_overrides(&mut config);
    if let Some(port) = args.port {
        set_port(&mut config, port);
    }

    logging::init_logging(&config.observability);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(config));
    // Bounded wait for connection tasks cut off by a forced close and for
    // queued blocking work.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    match result {
        Ok(outcome) => {
            tracing::info!(outcome = ?outcome, "Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<DrainOutcome, Box<dyn std::error::Error>> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        grace_period_secs = config.shutdown.grace_period_secs,
        upload_dir = %config.uploads.directory.display(),
        "debug-server starting"
    );

    // Installed first so a signal during the startup delay still exits cleanly.
    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    if config.startup.delay_secs > 0 {
        tracing::info!(delay_secs = config.startup.delay_secs, "Delaying startup");
        let mut early = shutdown.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(config.startup.delay_secs)) => {}
            _ = early.recv() => {
                tracing::info!("Shutdown requested during startup delay");
                return Ok(DrainOutcome::Completed);
            }
        }
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|e| format!("failed to bind {}: {}", config.listener.bind_address, e))?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    let outcome = server.run(listener, shutdown.subscribe()).await?;
    Ok(outcome)
}
