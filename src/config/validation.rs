//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject a missing or malformed base domain
//! - Validate value ranges (ports, timeouts, buffer limits)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{DirectoryBackend, ProxyConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("base domain is required (set BASE_DOMAIN)")]
    MissingBaseDomain,

    #[error(
        "base domain '{0}' must be a bare host name without port, dots at the edges or whitespace"
    )]
    InvalidBaseDomain(String),

    #[error("{0} must not be 0")]
    ZeroPort(&'static str),

    #[error("directory hash key must not be empty")]
    EmptyHashKey,

    #[error("forwarder connect timeout must be at least one second")]
    ZeroConnectTimeout,

    #[error("forwarder buffer limit must be positive when streaming is disabled")]
    ZeroBufferLimit,

    #[error("metrics address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let base_domain = &config.routing.base_domain;
    if base_domain.is_empty() {
        errors.push(ValidationError::MissingBaseDomain);
    } else if base_domain.contains(':')
        || base_domain.starts_with('.')
        || base_domain.ends_with('.')
        || base_domain.chars().any(char::is_whitespace)
    {
        errors.push(ValidationError::InvalidBaseDomain(base_domain.clone()));
    }

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort("listen port"));
    }
    if config.routing.default_dest_port == 0 {
        errors.push(ValidationError::ZeroPort("default destination port"));
    }

    if config.directory.backend == DirectoryBackend::Redis {
        if config.directory.port == 0 {
            errors.push(ValidationError::ZeroPort("directory port"));
        }
        if config.directory.hash_key.is_empty() {
            errors.push(ValidationError::EmptyHashKey);
        }
    }

    if config.forwarder.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if !config.forwarder.stream && config.forwarder.max_buffer_bytes == 0 {
        errors.push(ValidationError::ZeroBufferLimit);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
