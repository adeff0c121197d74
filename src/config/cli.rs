//! Command line and environment overrides.
//!
//! Every setting can come from a flag or from the environment variable named
//! in its `env` attribute. Values given here win over the config file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::ProxyConfig;

#[derive(Debug, Default, Parser)]
#[command(name = "vhost-mirror", version)]
#[command(
    about = "Virtual host reverse proxy backed by a key-value routing directory",
    long_about = None
)]
pub struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, env = "MIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listening port number [default: 8080]
    #[arg(long, env = "LISTEN_PORT")]
    pub listen_port: Option<u16>,

    /// Default destination port number [default: 80]
    #[arg(long, env = "DEST_PORT")]
    pub dest_port: Option<u16>,

    /// Base domain stripped from inbound host names (required)
    #[arg(long, env = "BASE_DOMAIN")]
    pub base_domain: Option<String>,

    /// Default destination URL (empty allowed)
    #[arg(long, env = "DEFAULT_DEST_URL")]
    pub default_dest_url: Option<String>,

    /// Hostname of the directory database [default: 127.0.0.1]
    #[arg(long, env = "DB_HOST")]
    pub db_host: Option<String>,

    /// Port number of the directory database [default: 6379]
    #[arg(long, env = "DB_PORT")]
    pub db_port: Option<u16>,

    /// Redis hash holding the routing rules [default: mirror-store]
    #[arg(long, env = "REDIS_HASH_KEY")]
    pub hash_key: Option<String>,

    /// Relay bodies as streams (on/off)
    #[arg(
        long,
        env = "ENABLE_STREAM",
        value_parser = parse_toggle,
        num_args = 0..=1,
        default_missing_value = "on"
    )]
    pub stream: Option<bool>,

    /// Log level used when RUST_LOG is unset [default: info]
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Overwrite `config` with every value supplied on the command line or environment.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(port) = self.listen_port {
            config.listener.port = port;
        }
        if let Some(port) = self.dest_port {
            config.routing.default_dest_port = port;
        }
        if let Some(domain) = &self.base_domain {
            config.routing.base_domain = domain.clone();
        }
        if let Some(url) = &self.default_dest_url {
            config.routing.default_dest_url = url.clone();
        }
        if let Some(host) = &self.db_host {
            config.directory.host = host.clone();
        }
        if let Some(port) = self.db_port {
            config.directory.port = port;
        }
        if let Some(key) = &self.hash_key {
            config.directory.hash_key = key.clone();
        }
        if let Some(stream) = self.stream {
            config.forwarder.stream = stream;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

/// Accepts the usual spellings of a boolean switch.
fn parse_toggle(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(format!("expected on/off, got '{other}'")),
    }
}
