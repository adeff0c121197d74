//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved request (absolute target URI)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → forwarder.rs (buffer or stream body, send via pooled client)
//!     → upstream response
//!     → headers.rs (strip hop-by-hop)
//!     → client
//! ```

pub mod forwarder;
pub mod headers;

pub use forwarder::{Forwarder, ForwarderInitError, RelayMode};
