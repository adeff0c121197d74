//! Upstream relay.
//!
//! # Responsibilities
//! - Send the rewritten request to the resolved upstream
//! - Relay the upstream response (status, headers, body) to the client
//! - Map connection-level failures to 502
//!
//! # Design Decisions
//! - Buffered mode reads whole bodies before relaying; streamed mode passes
//!   them through as they arrive
//! - No retries: a failed attempt is reported to the client as is
//! - Upstream sees its own authority in `Host`; the original host travels
//!   in `X-Forwarded-Host`

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::ForwarderConfig;
use crate::forward::headers::{set_forwarded_headers, strip_hop_by_hop};

/// Why a forwarder could not be constructed.
#[derive(Debug, Error)]
pub enum ForwarderInitError {
    #[error("connect timeout must be at least one second")]
    InvalidConnectTimeout,

    #[error("buffered relay needs a positive body limit")]
    InvalidBufferLimit,
}

/// How request and response bodies are relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    Buffered,
    Streamed,
}

impl RelayMode {
    pub fn from_stream_flag(stream: bool) -> Self {
        if stream {
            RelayMode::Streamed
        } else {
            RelayMode::Buffered
        }
    }
}

/// HTTP relay to upstream servers.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    mode: RelayMode,
    max_buffer_bytes: usize,
}

impl Forwarder {
    /// Create a forwarder from its configuration.
    pub fn new(config: &ForwarderConfig) -> Result<Self, ForwarderInitError> {
        if config.connect_timeout_secs == 0 {
            return Err(ForwarderInitError::InvalidConnectTimeout);
        }
        let mode = RelayMode::from_stream_flag(config.stream);
        if mode == RelayMode::Buffered && config.max_buffer_bytes == 0 {
            return Err(ForwarderInitError::InvalidBufferLimit);
        }

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            mode,
            max_buffer_bytes: config.max_buffer_bytes,
        })
    }

    pub fn mode(&self) -> RelayMode {
        self.mode
    }

    /// Relay `request` to `target` and return the upstream's response.
    ///
    /// `target` is absolute: its scheme and authority pick the upstream, its
    /// path and query become the outbound request line.
    pub async fn relay(
        &self,
        request: Request<Body>,
        target: Uri,
        peer: Option<SocketAddr>,
    ) -> Response {
        let (mut parts, body) = request.into_parts();

        let original_host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()));

        strip_hop_by_hop(&mut parts.headers);
        parts.headers.remove(header::HOST);
        set_forwarded_headers(&mut parts.headers, peer, original_host.as_deref());

        parts.uri = target;
        parts.version = Version::HTTP_11;

        let body = match self.mode {
            RelayMode::Streamed => body,
            RelayMode::Buffered => match axum::body::to_bytes(body, self.max_buffer_bytes).await {
                Ok(bytes) => Body::from(bytes),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        limit = self.max_buffer_bytes,
                        "Failed to buffer request body"
                    );
                    return (StatusCode::PAYLOAD_TOO_LARGE, "413 Request Entity Too Large\n")
                        .into_response();
                }
            },
        };

        let uri = parts.uri.clone();
        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);

                let body = match self.mode {
                    RelayMode::Streamed => Body::new(body),
                    RelayMode::Buffered => {
                        match axum::body::to_bytes(Body::new(body), usize::MAX).await {
                            Ok(bytes) => Body::from(bytes),
                            Err(e) => {
                                tracing::error!(
                                    upstream = %uri,
                                    error = %e,
                                    "Failed to read upstream body"
                                );
                                return bad_gateway();
                            }
                        }
                    }
                };

                Response::from_parts(parts, body)
            }
            Err(e) => {
                tracing::error!(upstream = %uri, error = %e, "Upstream request failed");
                bad_gateway()
            }
        }
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("mode", &self.mode)
            .field("max_buffer_bytes", &self.max_buffer_bytes)
            .finish_non_exhaustive()
    }
}

fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "502 Bad Gateway\n").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_connect_timeout() {
        let config = ForwarderConfig {
            connect_timeout_secs: 0,
            ..ForwarderConfig::default()
        };
        assert!(matches!(Forwarder::new(&config), Err(ForwarderInitError::InvalidConnectTimeout)));
    }

    #[test]
    fn buffered_mode_needs_limit() {
        let config = ForwarderConfig {
            max_buffer_bytes: 0,
            ..ForwarderConfig::default()
        };
        assert!(matches!(Forwarder::new(&config), Err(ForwarderInitError::InvalidBufferLimit)));

        let streamed = ForwarderConfig {
            stream: true,
            max_buffer_bytes: 0,
            ..ForwarderConfig::default()
        };
        assert_eq!(Forwarder::new(&streamed).unwrap().mode(), RelayMode::Streamed);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let forwarder = Forwarder::new(&ForwarderConfig::default()).unwrap();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let target: Uri = format!("http://{addr}/").parse().unwrap();

        let response = forwarder.relay(request, target, None).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn oversized_buffered_body_is_rejected() {
        let config = ForwarderConfig {
            max_buffer_bytes: 4,
            ..ForwarderConfig::default()
        };
        let forwarder = Forwarder::new(&config).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("more than four bytes"))
            .unwrap();
        let target: Uri = "http://127.0.0.1:9/".parse().unwrap();

        let response = forwarder.relay(request, target, None).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
