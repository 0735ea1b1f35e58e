//! Shared utilities for integration tests.

use axum::http::{HeaderMap, Method, Uri};
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use preview_server::config::ServerConfig;
use preview_server::http::HttpServer;
use preview_server::lifecycle::Shutdown;

/// Start a mock upstream that answers every request with its request line
/// and `Host` header, one per line.
#[allow(dead_code)]
pub async fn start_echo_backend() -> SocketAddr {
    start_programmable_backend(|request_line, host| {
        (200, Vec::new(), format!("{request_line}\nhost: {host}"))
    })
    .await
}

/// Start a mock upstream whose response is computed from the request line
/// and `Host` header: `(status, extra headers, body)`.
#[allow(dead_code)]
pub async fn start_programmable_backend<F>(f: F) -> SocketAddr
where
    F: Fn(&str, &str) -> (u16, Vec<(String, String)>, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = std::sync::Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        let request_line = head.lines().next().unwrap_or_default().to_string();
                        let host = head
                            .lines()
                            .filter_map(|line| line.split_once(':'))
                            .find(|(name, _)| name.eq_ignore_ascii_case("host"))
                            .map(|(_, value)| value.trim().to_string())
                            .unwrap_or_default();

                        let (status, headers, body) = f(&request_line, &host);
                        let status_text = match status {
                            200 => "200 OK",
                            201 => "201 Created",
                            302 => "302 Found",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };

                        let mut response = format!("HTTP/1.1 {status_text}\r\n");
                        for (name, value) in headers {
                            response.push_str(&format!("{name}: {value}\r\n"));
                        }
                        response.push_str(&format!(
                            "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        ));
                        let _ = socket.write_all(response.as_bytes()).await;
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

/// Start an upstream that answers `<METHOD> <path> x-trace=<value> <body>`.
#[allow(dead_code)]
pub async fn start_body_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(
        |method: Method, uri: Uri, headers: HeaderMap, body: String| async move {
            let trace = headers
                .get("x-trace")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            format!("{method} {} x-trace={trace} {body}", uri.path())
        },
    );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Write a rule file into `dir` and return a config that reads it on every
/// request, with fixtures rooted in `dir`.
#[allow(dead_code)]
pub fn config_in(dir: &Path, rules: &str) -> ServerConfig {
    let rule_file = dir.join("server.conf");
    std::fs::write(&rule_file, rules).unwrap();

    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.rewrite.rule_files = vec![rule_file];
    config.fixtures.view_path = dir.join("views");
    config.fixtures.data_paths = vec![dir.join("test")];
    config
}

/// Serve `rules` with fixtures rooted in `dir` on an ephemeral port.
#[allow(dead_code)]
pub async fn serve_rules(dir: &Path, rules: &str) -> (SocketAddr, Shutdown) {
    spawn_server(HttpServer::new(config_in(dir, rules))).await
}

/// Run `server` on an ephemeral port. The server stops when the returned
/// [`Shutdown`] is triggered or dropped.
#[allow(dead_code)]
pub async fn spawn_server(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}
