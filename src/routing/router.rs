//! Per-request routing.
//!
//! # Request Lifecycle
//! ```text
//! Received
//!     → split_virtual_host      ──fail──▶ 404 (host parse error)
//! HostResolved
//!     → resolve_destination     ──fail──▶ 404 (lookup / no upstream / bad URL)
//! DestinationResolved
//!     → rewrite request target
//!     → Forwarder::relay
//! Forwarded
//! ```
//!
//! # Design Decisions
//! - Every resolution failure is terminal and produces the same 404
//! - No retries; the forwarder owns the response once it is called
//! - Immutable after construction (shared without locks)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::config::ProxyConfig;
use crate::directory::Directory;
use crate::error::ResolveError;
use crate::forward::{Forwarder, RelayMode};
use crate::observability::metrics;
use crate::routing::destination::{resolve_destination, DestinationUrl};
use crate::routing::host::split_virtual_host;

/// Body of every not-found response.
pub const NOT_FOUND_BODY: &str = "404 Upstream Not Found\n";

/// Composition root: owns the directory and forwarder for the process lifetime.
pub struct VhostRouter {
    directory: Arc<dyn Directory>,
    forwarder: Forwarder,
    base_domain: String,
    default_dest_port: u16,
}

impl VhostRouter {
    pub fn new(config: &ProxyConfig, directory: Arc<dyn Directory>, forwarder: Forwarder) -> Self {
        Self {
            directory,
            forwarder,
            base_domain: config.routing.base_domain.clone(),
            default_dest_port: config.routing.default_dest_port,
        }
    }

    /// The directory this router reads from.
    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    /// Resolve a Host header and inbound path to a destination.
    pub async fn resolve(&self, host: &str, path: &str) -> Result<DestinationUrl, ResolveError> {
        let tenant = split_virtual_host(host, &self.base_domain)?;
        tracing::trace!(host = %host, tenant = %tenant, "Split virtual host");
        resolve_destination(&tenant, self.directory.as_ref(), path, self.default_dest_port).await
    }

    /// Handle one inbound request end to end.
    pub async fn handle(&self, request: Request<Body>, peer: Option<SocketAddr>) -> Response {
        let start = Instant::now();
        let method = request.method().to_string();
        let host = request_host(&request);
        let path = request.uri().path().to_string();

        let destination = match self.resolve(&host, &path).await {
            Ok(destination) => destination,
            Err(e) => return self.reject(&method, &host, &e, start),
        };

        let target = request_target(&destination, self.forwarder.mode());
        let uri = match destination.to_uri(&target) {
            Ok(uri) => uri,
            Err(e) => return self.reject(&method, &host, &e, start),
        };

        tracing::debug!(
            host = %host,
            path = %path,
            destination = %destination,
            "Forwarding request"
        );

        let response = self.forwarder.relay(request, uri, peer).await;
        metrics::record_request(
            &method,
            response.status().as_u16(),
            metrics::OUTCOME_FORWARDED,
            start,
        );
        response
    }

    fn reject(&self, method: &str, host: &str, error: &ResolveError, start: Instant) -> Response {
        tracing::error!(host = %host, error = %error, "Upstream not found");
        metrics::record_resolve_failure(error);
        metrics::record_request(
            method,
            StatusCode::NOT_FOUND.as_u16(),
            metrics::OUTCOME_NOT_FOUND,
            start,
        );
        not_found()
    }
}

/// Outbound request-line target for a resolved destination.
///
/// Streamed relays always request `/`: the scheme, host and port already
/// carry the routing decision.
pub fn request_target(destination: &DestinationUrl, mode: RelayMode) -> String {
    match mode {
        RelayMode::Streamed => "/".to_string(),
        RelayMode::Buffered => destination.request_target(),
    }
}

/// The uniform response for every resolution failure.
pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        NOT_FOUND_BODY,
    )
        .into_response()
}

/// Host the client asked for: the absolute-form authority if present,
/// else the Host header. Empty when neither is usable.
fn request_host(request: &Request<Body>) -> String {
    if let Some(authority) = request.uri().authority() {
        return authority.to_string();
    }
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
