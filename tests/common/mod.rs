//! Shared utilities for gateway integration tests.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use api_gateway::config::GatewayConfig;
use api_gateway::http::HttpServer;
use api_gateway::lifecycle::Shutdown;
use api_gateway::security::Claims;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Base config for tests: signing secret set, general limiter out of the way.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.rate_limit.general.max_requests = 10_000;
    config
}

/// Bind and run a gateway; the returned coordinator stops it.
pub async fn start_gateway(config: GatewayConfig, addr: SocketAddr) -> Shutdown {
    let listener = TcpListener::bind(addr).await.unwrap();
    let server = HttpServer::new(config);
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    shutdown
}

/// Sign an access token the way the auth service does.
pub fn mint_access_token(id: i64) -> String {
    let claims = Claims {
        id,
        email: Some("user@example.com".to_string()),
        name: Some("Test User".to_string()),
        token_type: None,
        exp: get_current_timestamp() + 3600,
        iat: Some(get_current_timestamp()),
    };
    sign(&claims)
}

/// Sign a refresh token: `id` and `type` only, longer lived.
pub fn mint_refresh_token(id: i64) -> String {
    let claims = Claims {
        id,
        email: None,
        name: None,
        token_type: Some("refresh".to_string()),
        exp: get_current_timestamp() + 30 * 24 * 3600,
        iat: None,
    };
    sign(&claims)
}

fn sign(claims: &Claims) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Start a simple mock upstream that returns a fixed response.
pub async fn start_mock_backend(addr: SocketAddr, response: &'static str) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let _ = read_head(&mut socket, &mut buf).await;
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a programmable mock upstream with async support.
pub async fn start_programmable_backend<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let _ = read_head(&mut socket, &mut buf).await;
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a mock upstream that records request lines (e.g. "GET /meals/today
/// HTTP/1.1") so tests can assert on rewritten paths.
pub async fn start_recording_backend(addr: SocketAddr) -> Arc<Mutex<Vec<String>>> {
    let listener = TcpListener::bind(addr).await.unwrap();
    let recorded: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let lines = recorded.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let lines = lines.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let read = read_head(&mut socket, &mut buf).await;
                        let head = String::from_utf8_lossy(&buf[..read]);
                        if let Some(line) = head.lines().next() {
                            lines.lock().unwrap().push(line.to_string());
                        }
                        let body = "{\"ok\":true}";
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    recorded
}

/// Read until the end of the request head (or the buffer fills).
async fn read_head(socket: &mut tokio::net::TcpStream, buf: &mut [u8]) -> usize {
    let mut total = 0;
    loop {
        match socket.read(&mut buf[total..]).await {
            Ok(0) => break,
            Ok(n) => {
                total += n;
                if buf[..total].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
                if total == buf.len() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    total
}
