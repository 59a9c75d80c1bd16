//! The `debug-server` binary under SIGTERM.

#![cfg(unix)]

use std::net::TcpListener;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn start(port: u16, startup_delay: u64) -> Child {
    Command::new(env!("CARGO_BIN_EXE_debug-server"))
        .arg("--port")
        .arg(port.to_string())
        .env("STARTUP_DELAY", startup_delay.to_string())
        .env_remove("PORT")
        .env_remove("DEBUG_SERVER_CONFIG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

fn sigterm(child: &Child) {
    let status = Command::new("kill")
        .arg("-TERM")
        .arg(child.id().to_string())
        .status()
        .unwrap();
    assert!(status.success());
}

fn wait_exit(child: &mut Child, limit: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return Some(status);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    None
}

async fn wait_ready(client: &reqwest::Client, port: u16) {
    let url = format!("http://127.0.0.1:{}/healthz", port);
    for _ in 0..100 {
        if let Ok(res) = client.get(&url).send().await {
            if res.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("server on port {} never became ready", port);
}

#[tokio::test]
async fn running_cpu_stress_does_not_delay_exit() {
    let port = free_port();
    let mut child = start(port, 0);
    let client = reqwest::Client::new();
    wait_ready(&client, port).await;

    let res = client
        .get(format!(
            "http://127.0.0.1:{}/stress/cpu?cpu_percent=5&duration=60",
            port
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    sigterm(&child);

    // Default grace period is 5s; nothing is in flight, so exit is prompt.
    let status = wait_exit(&mut child, Duration::from_secs(5));
    if status.is_none() {
        let _ = child.kill();
    }
    let status = status.expect("server should exit well before the stress job ends");
    assert_eq!(status.code(), Some(0));
}

#[tokio::test]
async fn signal_during_startup_delay_exits_cleanly() {
    let mut child = start(free_port(), 60);

    // Give the process time to install its signal handler.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    sigterm(&child);

    let status = wait_exit(&mut child, Duration::from_secs(5));
    if status.is_none() {
        let _ = child.kill();
    }
    let status = status.expect("server should stop during the startup delay");
    assert_eq!(status.code(), Some(0));
}
