//! Shared utilities for integration testing.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use vhost_mirror::config::{DirectoryBackend, ProxyConfig};
use vhost_mirror::error::StartupError;
use vhost_mirror::lifecycle::{startup, Shutdown};

pub const BASE_DOMAIN: &str = "mirror.test";

/// Start a mock upstream that replies with `<Host header><request target>`.
///
/// The `X-Forwarded-Host` it received comes back in `x-echo-forwarded-host`.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }

                        let head = String::from_utf8_lossy(&head);
                        let mut lines = head.split("\r\n");
                        let target = lines
                            .next()
                            .and_then(|line| line.split(' ').nth(1))
                            .unwrap_or_default()
                            .to_string();

                        let headers: BTreeMap<String, String> = lines
                            .filter_map(|line| line.split_once(':'))
                            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
                            .collect();
                        let host = headers.get("host").cloned().unwrap_or_default();
                        let forwarded_host = headers
                            .get("x-forwarded-host")
                            .cloned()
                            .unwrap_or_default();

                        let body = format!("{host}{target}");
                        let response = format!(
                            "HTTP/1.1 200 OK\r\n\
                             Content-Length: {}\r\n\
                             x-echo-forwarded-host: {}\r\n\
                             Connection: close\r\n\r\n{}",
                            body.len(),
                            forwarded_host,
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Proxy config backed by the in-memory directory.
pub fn memory_config(default_dest_url: &str, entries: &[(&str, String)]) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.routing.base_domain = BASE_DOMAIN.to_string();
    config.routing.default_dest_url = default_dest_url.to_string();
    config.directory.backend = DirectoryBackend::Memory;
    for (key, value) in entries {
        config.directory.entries.insert(key.to_string(), value.clone());
    }
    config
}

/// A proxy running on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), StartupError>>,
}

impl TestProxy {
    pub async fn start(config: ProxyConfig) -> Self {
        let directory = startup::connect_directory(&config).await.unwrap();
        let router = startup::build_router(&config, directory).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let handle = tokio::spawn(startup::serve(router, listener, shutdown.signalled()));

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    /// Send a GET through the proxy with the given Host header.
    pub async fn get(&self, host: &str, path: &str) -> reqwest::Response {
        reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap()
            .get(format!("http://{}{}", self.addr, path))
            .header(reqwest::header::HOST, host)
            .send()
            .await
            .unwrap()
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}
