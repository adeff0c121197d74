//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing span)
//!     → routing::VhostRouter (Host header → destination)
//!     → forward::Forwarder (relay to upstream)
//!     → Send to client
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
