use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use debug_server::config::{LogFormat, ObservabilityConfig};
use debug_server::interop;
use debug_server::lifecycle::termination_signal;
use debug_server::observability::logging;

#[derive(Parser)]
#[command(name = "interop-echo")]
#[command(about = "Minimal /healthz and /echo service for interop checks", long_about = None)]
struct Cli {
    #[arg(short, long, default_value_t = interop::DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(&ObservabilityConfig {
        log_level: cli.log_level,
        log_format: LogFormat::Json,
        ..ObservabilityConfig::default()
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(address = %addr, service = interop::SERVICE_NAME, "Interop service listening");

    let served = axum::serve(listener, interop::router())
        .with_graceful_shutdown(async {
            let signal = termination_signal().await;
            tracing::info!(signal, "Termination signal received");
        })
        .await;

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Interop service failed");
            ExitCode::FAILURE
        }
    }
}
