//! Common test utilities: a mock repository service for integration tests

use dpres_dl::{Config, CredentialsConfig, RetryConfig};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing at a mock server, with fast retries and no jitter
#[allow(dead_code)]
pub fn test_config(server_address: &str) -> Config {
    Config {
        credentials: CredentialsConfig {
            username: "archivist".to_string(),
            password: "secret".to_string(),
            tenant: "museum".to_string(),
            server_address: server_address.to_string(),
        },
        retry: RetryConfig {
            max_attempts: 0,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..Default::default()
    }
}

/// Mount a successful login endpoint
#[allow(dead_code)]
pub async fn mount_login(server: &MockServer, valid_for: u64) {
    Mock::given(method("POST"))
        .and(path("/api/accesstoken/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-1",
            "validFor": valid_for,
        })))
        .mount(server)
        .await;
}

/// Abbreviated folder record as carried by children pages
#[allow(dead_code)]
pub fn folder(reference: &str, title: &str, parent: Option<&str>) -> Value {
    entity_record(reference, "folder", title, parent)
}

/// Abbreviated asset record as carried by children pages
#[allow(dead_code)]
pub fn asset(reference: &str, title: &str, parent: Option<&str>) -> Value {
    entity_record(reference, "asset", title, parent)
}

fn entity_record(reference: &str, kind: &str, title: &str, parent: Option<&str>) -> Value {
    let mut record = json!({
        "ref": reference,
        "kind": kind,
        "title": title,
        "securityTag": "open",
    });
    if let Some(parent) = parent {
        record["parent"] = json!(parent);
    }
    record
}

/// One page of a folder's children
#[allow(dead_code)]
pub fn page(children: &[Value], total: u64) -> Value {
    json!({ "children": children, "total": total })
}

/// Mount one children page for a folder (None = repository root)
#[allow(dead_code)]
pub async fn mount_children(
    server: &MockServer,
    parent: Option<&str>,
    start: u64,
    max: usize,
    body: Value,
) {
    let endpoint = match parent {
        Some(reference) => format!("/api/entity/entities/{reference}/children"),
        None => "/api/entity/root/children".to_string(),
    };
    Mock::given(method("GET"))
        .and(path(endpoint))
        .and(query_param("start", start.to_string()))
        .and(query_param("max", max.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Count received requests whose path contains `needle`
#[allow(dead_code)]
pub async fn count_requests(server: &MockServer, needle: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path().contains(needle))
        .count()
}

/// Spawn a raw TCP repository that truncates content responses
///
/// Login requests are answered normally. Content requests declare
/// `declared` bytes but deliver only `actual`, then sever the connection,
/// simulating a bitstream interruption. Returns the server address.
#[allow(dead_code)]
pub async fn spawn_truncating_repo(declared: usize, actual: Vec<u8>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let actual = actual.clone();
            tokio::spawn(async move {
                let request = match read_request(&mut socket).await {
                    Some(request) => request,
                    None => return,
                };
                if request.starts_with("POST /api/accesstoken/login") {
                    let body = br#"{"token":"tok-1","validFor":900}"#;
                    let head = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(body).await;
                } else {
                    let head = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {declared}\r\nConnection: close\r\n\r\n"
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(&actual).await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

/// Read one HTTP request (headers plus any Content-Length body), best effort
async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(header_end) = find_header_end(&buf) {
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let body_len = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + body_len {
                break;
            }
        }
    }
    if buf.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&buf).to_string())
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}
