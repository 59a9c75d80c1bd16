//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use debug_server::config::ServerConfig;
use debug_server::http::{ActiveStreams, DrainOutcome, HttpServer, ServerError, StreamKind};
use debug_server::lifecycle::{Lifecycle, Shutdown};
use debug_server::observability::MemorySink;

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub lifecycle: Arc<Lifecycle>,
    pub streams: Arc<ActiveStreams>,
    pub access_log: MemorySink,
    pub exit_codes: Arc<Mutex<Vec<i32>>>,
    pub handle: JoinHandle<Result<DrainOutcome, ServerError>>,
    _uploads: tempfile::TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Wait up to `limit` for the open count of `kind` to reach `expected`.
    pub async fn wait_for_streams(
        &self,
        kind: StreamKind,
        expected: usize,
        limit: Duration,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if self.streams.count(kind) == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.streams.count(kind) == expected
    }
}

/// Start a server with `tweak` applied to a test configuration.
///
/// Uploads go to a fresh temp dir and `/crash`/`/shutdown` record their
/// exit code instead of exiting.
pub async fn spawn_server_with(tweak: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let uploads = tempfile::tempdir().unwrap();

    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.uploads.directory = uploads.path().to_path_buf();
    config.shutdown.grace_period_secs = 2;
    config.upstream.timeout_secs = 5;
    tweak(&mut config);

    let access_log = MemorySink::new();
    let exit_codes = Arc::new(Mutex::new(Vec::new()));
    let recorded = exit_codes.clone();

    let server = HttpServer::new(config)
        .unwrap()
        .with_access_log(Arc::new(access_log.clone()))
        .with_exit_hook(Arc::new(move |code: i32| recorded.lock().unwrap().push(code)));
    let lifecycle = server.lifecycle();
    let streams = server.state().streams.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        lifecycle,
        streams,
        access_log,
        exit_codes,
        handle,
        _uploads: uploads,
    }
}

pub async fn spawn_server() -> TestServer {
    spawn_server_with(|_| {}).await
}

/// Start a simple mock upstream that returns a fixed response.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Client that never reuses connections between test steps.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
