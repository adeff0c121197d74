//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files;
//! environment variables and flags are layered on top by `config::cli`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host, port).
    pub listener: ListenerConfig,

    /// Virtual host routing settings.
    pub routing: RoutingConfig,

    /// Routing directory backend.
    pub directory: DirectoryConfig,

    /// Upstream relay settings.
    pub forwarder: ForwarderConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Listening port.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Virtual host routing settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Suffix stripped from inbound host names to recover the tenant key.
    /// Required; there is no default.
    pub base_domain: String,

    /// Destination stored under the `default` key. Empty means no default upstream.
    pub default_dest_url: String,

    /// Port appended to destinations that do not carry one.
    pub default_dest_port: u16,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_domain: String::new(),
            default_dest_url: String::new(),
            default_dest_port: 80,
        }
    }
}

/// Which directory implementation backs the routing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryBackend {
    #[default]
    Redis,
    Memory,
}

/// Directory connection parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub backend: DirectoryBackend,

    /// Redis server host.
    pub host: String,

    /// Redis server port.
    pub port: u16,

    /// Redis database number.
    pub database: u8,

    /// Redis password (optional).
    pub password: Option<String>,

    /// Hash that holds every routing rule, including `default`.
    pub hash_key: String,

    /// Static routing rules for the memory backend.
    pub entries: BTreeMap<String, String>,
}

impl DirectoryConfig {
    /// Build the Redis connection URL.
    pub fn redis_url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.database
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            backend: DirectoryBackend::Redis,
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 0,
            password: None,
            hash_key: "mirror-store".to_string(),
            entries: BTreeMap::new(),
        }
    }
}

/// Upstream relay settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Relay bodies as streams instead of buffering them.
    pub stream: bool,

    /// Upstream connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Largest request body accepted in buffered mode.
    pub max_buffer_bytes: usize,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            stream: false,
            connect_timeout_secs: 5,
            max_buffer_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
