//! Virtual host mirror
//!
//! A reverse proxy that picks its upstream from the inbound Host header.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  VHOST MIRROR                    │
//!                        │                                                  │
//!     Client Request     │  ┌─────────┐    ┌──────────────┐                 │
//!     ───────────────────┼─▶│  http   │───▶│   routing    │                 │
//!                        │  │ server  │    │ host → key   │                 │
//!                        │  └─────────┘    └──────┬───────┘                 │
//!                        │                        │  get(key)               │
//!                        │                        ▼                         │
//!                        │                 ┌──────────────┐   ┌──────────┐  │
//!                        │                 │  directory   │──▶│  Redis   │  │
//!                        │                 │ redis/memory │   └──────────┘  │
//!                        │                 └──────┬───────┘                 │
//!                        │                        │ destination URL         │
//!                        │                        ▼                         │
//!     Client Response    │                 ┌──────────────┐                 │
//!     ◀──────────────────┼─────────────────│   forward    │◀────────────────┼──── Upstream
//!                        │                 │buffered/stream│                │
//!                        │                 └──────────────┘                 │
//!                        │                                                  │
//!                        │  config · observability · lifecycle              │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use clap::Parser;

use vhost_mirror::config::{loader, Cli};
use vhost_mirror::lifecycle::{signals, startup, Shutdown};
use vhost_mirror::observability::{logging, metrics};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match loader::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    logging::init(&config.observability.log_level);
    tracing::info!("vhost-mirror v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        listen = %config.listener.bind_address(),
        base_domain = %config.routing.base_domain,
        default_dest_port = config.routing.default_dest_port,
        directory = ?config.directory.backend,
        stream = config.forwarder.stream,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = startup::run(config, shutdown).await {
        tracing::error!(error = %e, "Proxy failed");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}
