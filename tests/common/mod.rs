//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alert_watcher::config::WatcherConfig;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A webhook endpoint that records request bodies and answers with a
/// scripted status per request (1-based request number).
pub struct MockWebhook {
    pub addr: SocketAddr,
    hits: Arc<AtomicU32>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

#[allow(dead_code)]
impl MockWebhook {
    pub fn url(&self) -> String {
        format!("http://{}/hook", self.addr)
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn types(&self) -> Vec<String> {
        self.bodies()
            .iter()
            .map(|b| b["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Wait until at least `n` requests arrived.
    pub async fn wait_for_hits(&self, n: u32) {
        for _ in 0..250 {
            if self.hits() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {} webhook hits, got {}", n, self.hits());
    }
}

/// Start a mock webhook that always returns 200.
#[allow(dead_code)]
pub async fn start_mock_webhook() -> MockWebhook {
    start_programmable_webhook(|_| 200).await
}

/// Start a mock webhook whose status depends on the request number.
pub async fn start_programmable_webhook<F>(status_for: F) -> MockWebhook
where
    F: Fn(u32) -> u16 + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let status_for = Arc::new(status_for);

    let (h, b) = (hits.clone(), bodies.clone());
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let (h, b, status_for) = (h.clone(), b.clone(), status_for.clone());
                    tokio::spawn(async move {
                        handle(socket, h, b, status_for).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockWebhook { addr, hits, bodies }
}

async fn handle<F>(mut socket: TcpStream, hits: Arc<AtomicU32>, bodies: Arc<Mutex<Vec<Value>>>, status_for: Arc<F>)
where
    F: Fn(u32) -> u16 + Send + Sync + 'static,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let body = &buf[header_end..header_end + content_length];
    if let Ok(json) = serde_json::from_slice::<Value>(body) {
        bodies.lock().unwrap().push(json);
    }
    let request_number = hits.fetch_add(1, Ordering::SeqCst) + 1;

    let status = status_for(request_number);
    let status_text = match status {
        200 => "200 OK".to_string(),
        404 => "404 Not Found".to_string(),
        429 => "429 Too Many Requests".to_string(),
        500 => "500 Internal Server Error".to_string(),
        502 => "502 Bad Gateway".to_string(),
        503 => "503 Service Unavailable".to_string(),
        other => format!("{} Status", other),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
        status_text
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Test configuration: small window, fast retries, marker under `dir`.
pub fn test_config(url: &str, dir: &Path) -> WatcherConfig {
    let mut config = WatcherConfig::default();
    config.webhook.url = Some(url.to_string());
    config.webhook.timeout_secs = 2;
    config.webhook.base_delay_ms = 10;
    config.webhook.max_delay_ms = 50;
    config.webhook.bypass_proxy = true;
    config.detection.window_size = 200;
    config.detection.primary_pool = Some("blue".to_string());
    config.alerts.cooldown_secs = 300;
    config.alerts.maintenance_flag = dir.join("maintenance").to_string_lossy().to_string();
    config.tail.log_path = dir.join("access.log").to_string_lossy().to_string();
    config.tail.poll_interval_ms = 20;
    config.tail.reopen_max_delay_ms = 100;
    config
}

/// A JSON access log line.
pub fn line(status: u16, pool: &str) -> String {
    format!(
        r#"{{"time":"2026-10-16T10:00:00+00:00","status":{},"upstream_status":"{}","pool":"{}","release":"{}-v1"}}"#,
        status, status, pool, pool
    )
}
