use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::{future::join_all, SinkExt, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "debug-cli")]
#[command(about = "Client for the diagnostic debug server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080", env = "DEBUG_SERVER_URL")]
    url: String,

    /// Per-request timeout in seconds.
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness probe
    Health,
    /// Readiness probe
    Ready,
    /// Echo a request, optionally delayed or with a forced status
    Debug {
        #[arg(long)]
        seconds: Option<u64>,
        #[arg(long)]
        status_code: Option<u16>,
        /// JSON or text body to send.
        #[arg(long)]
        body: Option<String>,
    },
    /// Emit a log line on the server
    Log {
        #[arg(long)]
        message: String,
        #[arg(long, default_value = "info")]
        level: String,
    },
    /// Start a background CPU stress job
    StressCpu {
        #[arg(long)]
        percent: u8,
        #[arg(long, default_value_t = 10)]
        duration: u64,
    },
    /// Start a background memory stress job
    StressMemory {
        #[arg(long)]
        percent: u8,
        #[arg(long, default_value_t = 10)]
        duration: u64,
    },
    /// Show server CPU and memory figures
    SystemInfo,
    /// Send text messages over the WebSocket echo and print the replies
    Ws {
        #[arg(required = true)]
        messages: Vec<String>,
    },
    /// Print the first N server-sent events
    Sse {
        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,
    },
    /// Aggregate `/healthz` across several services
    Probe {
        /// `name=url` pairs; defaults to the interop services on localhost.
        #[arg(long = "target")]
        targets: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .default_headers(request_headers()?)
        .build()?;
    let base = cli.url.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/healthz", base)).send().await?;
            print_response(res).await
        }
        Commands::Ready => {
            let res = client.get(format!("{}/readiness", base)).send().await?;
            print_response(res).await
        }
        Commands::Debug {
            seconds,
            status_code,
            body,
        } => {
            let mut query = Vec::new();
            if let Some(seconds) = seconds {
                query.push(("seconds", seconds.to_string()));
            }
            if let Some(code) = status_code {
                query.push(("status_code", code.to_string()));
            }
            let mut req = client.post(format!("{}/debug", base)).query(&query);
            if let Some(body) = body {
                req = req.body(body);
            }
            print_response(req.send().await?).await
        }
        Commands::Log { message, level } => {
            let res = client
                .post(format!("{}/log", base))
                .query(&[("message", message), ("level", level)])
                .send()
                .await?;
            print_response(res).await
        }
        Commands::StressCpu { percent, duration } => {
            let res = client
                .get(format!("{}/stress/cpu", base))
                .query(&[("cpu_percent", percent as u64), ("duration", duration)])
                .send()
                .await?;
            print_response(res).await
        }
        Commands::StressMemory { percent, duration } => {
            let res = client
                .get(format!("{}/stress/memory", base))
                .query(&[("memory_percent", percent as u64), ("duration", duration)])
                .send()
                .await?;
            print_response(res).await
        }
        Commands::SystemInfo => {
            let res = client.get(format!("{}/system-info", base)).send().await?;
            print_response(res).await
        }
        Commands::Ws { messages } => websocket(&base, messages).await,
        Commands::Sse { count } => sse(&client, &base, count).await,
        Commands::Probe { targets } => probe(&client, targets).await,
    }
}

fn request_headers() -> CliResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-request-id",
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())?,
    );
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> CliResult<ExitCode> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(ExitCode::FAILURE);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(ExitCode::SUCCESS)
}

async fn websocket(base: &str, messages: Vec<String>) -> CliResult<ExitCode> {
    let mut url = url::Url::parse(base)?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|_| format!("cannot derive a WebSocket URL from {}", base))?;
    url.set_path("/websocket");

    let (mut socket, _) = connect_async(url.as_str()).await?;
    for message in messages {
        socket.send(Message::text(message)).await?;
        match socket.next().await {
            Some(Ok(Message::Text(reply))) => println!("{}", reply.as_str()),
            Some(Ok(other)) => println!("{:?}", other),
            Some(Err(e)) => return Err(e.into()),
            None => {
                eprintln!("Error: connection closed by server");
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    socket.close(None).await?;
    Ok(ExitCode::SUCCESS)
}

async fn sse(client: &reqwest::Client, base: &str, count: usize) -> CliResult<ExitCode> {
    let res = client.get(format!("{}/sse", base)).send().await?;
    if !res.status().is_success() {
        return print_response(res).await;
    }

    let mut stream = res.bytes_stream();
    let mut buffer = String::new();
    let mut seen = 0;
    while seen < count {
        let Some(chunk) = stream.next().await else {
            break;
        };
        buffer.push_str(&String::from_utf8_lossy(&chunk?));
        while let Some(end) = buffer.find("\n\n") {
            let event: String = buffer.drain(..end + 2).collect();
            for line in event.lines().filter(|line| line.starts_with("data:")) {
                println!("{}", line.trim_start_matches("data:").trim());
            }
            seen += 1;
            if seen == count {
                break;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn default_targets() -> Vec<(String, String)> {
    [
        ("python", 8081),
        ("golang", 8082),
        ("nodejs", 8083),
        ("ballerina", 8084),
        ("java", 8085),
        ("rust", 8086),
    ]
    .into_iter()
    .map(|(name, port)| (name.to_string(), format!("http://localhost:{}/healthz", port)))
    .collect()
}

/// `name=url`, or a bare URL used as its own name. A `=` inside a URL
/// (query string) does not start a name.
fn parse_target(raw: &str) -> (String, String) {
    match raw.split_once('=') {
        Some((name, url)) if !name.is_empty() && !name.contains(['/', ':']) => {
            (name.to_string(), url.to_string())
        }
        _ => (raw.to_string(), raw.to_string()),
    }
}

/// Aggregate per-service health into the printed report.
fn summarize(results: Vec<(String, bool)>) -> (Value, bool) {
    let all_healthy = results.iter().all(|(_, healthy)| *healthy);
    let services: Vec<Value> = results
        .into_iter()
        .map(|(name, healthy)| {
            json!({
                "service": name,
                "status": if healthy { "healthy" } else { "unhealthy" },
            })
        })
        .collect();
    let report = json!({
        "status": if all_healthy { "healthy" } else { "unhealthy" },
        "services": services,
    });
    (report, all_healthy)
}

async fn probe(client: &reqwest::Client, targets: Vec<String>) -> CliResult<ExitCode> {
    let targets = if targets.is_empty() {
        default_targets()
    } else {
        targets.iter().map(|raw| parse_target(raw)).collect()
    };

    let results = join_all(targets.into_iter().map(|(name, url)| async move {
        let healthy = matches!(
            client.get(&url).send().await,
            Ok(res) if res.status().is_success()
        );
        (name, healthy)
    }))
    .await;

    let (report, all_healthy) = summarize(results);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if all_healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_target() {
        assert_eq!(
            parse_target("api=http://10.0.0.5:8080/healthz"),
            ("api".to_string(), "http://10.0.0.5:8080/healthz".to_string())
        );
    }

    #[test]
    fn bare_url_names_itself() {
        let url = "http://localhost:9000/healthz";
        assert_eq!(parse_target(url), (url.to_string(), url.to_string()));

        let with_query = "http://localhost:9000/healthz?full=1";
        assert_eq!(
            parse_target(with_query),
            (with_query.to_string(), with_query.to_string())
        );
    }

    #[test]
    fn defaults_cover_the_interop_ports() {
        let targets = default_targets();
        assert_eq!(targets.len(), 6);
        assert_eq!(targets[0], ("python".to_string(), "http://localhost:8081/healthz".to_string()));
        assert_eq!(targets[5].1, "http://localhost:8086/healthz");
    }

    #[test]
    fn all_healthy_report() {
        let (report, healthy) = summarize(vec![("a".into(), true), ("b".into(), true)]);
        assert!(healthy);
        assert_eq!(report["status"], "healthy");
        assert_eq!(report["services"][1]["service"], "b");
        assert_eq!(report["services"][1]["status"], "healthy");
    }

    #[test]
    fn one_failure_marks_the_report_unhealthy() {
        let (report, healthy) = summarize(vec![("a".into(), true), ("b".into(), false)]);
        assert!(!healthy);
        assert_eq!(report["status"], "unhealthy");
        assert_eq!(report["services"][0]["status"], "healthy");
        assert_eq!(report["services"][1]["status"], "unhealthy");
    }

    #[test]
    fn no_targets_is_healthy() {
        let (report, healthy) = summarize(Vec::new());
        assert!(healthy);
        assert_eq!(report["services"], json!([]));
    }
}
