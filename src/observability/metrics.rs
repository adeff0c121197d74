//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mirror_requests_total` (counter): requests by method, status, outcome
//! - `mirror_request_duration_seconds` (histogram): time spent per request
//! - `mirror_resolve_failures_total` (counter): 404s by failure kind
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::ResolveError;

/// Outcome label for requests handed to the forwarder.
pub const OUTCOME_FORWARDED: &str = "forwarded";
/// Outcome label for requests answered with 404.
pub const OUTCOME_NOT_FOUND: &str = "not_found";

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    ::metrics::counter!(
        "mirror_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    ::metrics::histogram!(
        "mirror_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record why a request could not be routed.
pub fn record_resolve_failure(error: &ResolveError) {
    let kind = match error {
        ResolveError::HostParse { .. } => "host_parse",
        ResolveError::UpstreamLookup { .. } => "upstream_lookup",
        ResolveError::NoUpstream { .. } => "no_upstream",
        ResolveError::DestinationParse { .. } => "destination_parse",
    };
    ::metrics::counter!("mirror_resolve_failures_total", "kind" => kind).increment(1);
}
