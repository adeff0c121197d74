//! Error types shared across subsystems.
//!
//! Per-request failures ([`ResolveError`]) never escape the router: they are
//! logged and turned into a 404. Startup failures ([`StartupError`]) are fatal.

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::forward::ForwarderInitError;

/// Failures talking to the routing directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Could not establish the initial connection.
    #[error("failed to connect to directory at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: redis::RedisError,
    },

    /// A command failed at the transport or protocol level.
    #[error("directory command '{command}' failed: {source}")]
    Command {
        command: String,
        #[source]
        source: redis::RedisError,
    },

    /// The directory has already been closed.
    #[error("directory is closed")]
    Closed,
}

/// Per-request resolution failures. All of them map to a 404.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to split virtual host '{host}': {reason}")]
    HostParse { host: String, reason: &'static str },

    #[error("failed to get upstream URL for '{key}' from directory: {source}")]
    UpstreamLookup {
        key: String,
        #[source]
        source: DirectoryError,
    },

    #[error("no upstream exists for '{key}'")]
    NoUpstream { key: String },

    #[error("invalid upstream URL '{url}': {reason}")]
    DestinationParse { url: String, reason: String },
}

/// Fatal errors raised before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("directory unavailable: {0}")]
    DirectoryConnect(#[source] DirectoryError),

    #[error("failed to initialize forwarder: {0}")]
    ForwarderInit(#[from] ForwarderInitError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
