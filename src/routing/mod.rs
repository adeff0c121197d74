//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header, path)
//!     → host.rs (strip port and base domain → tenant key)
//!     → Directory::get(tenant) (raw destination pattern)
//!     → destination.rs (scheme/port defaults, path override, placeholders)
//!     → router.rs (rewrite target, hand to forwarder, or 404)
//! ```
//!
//! # Design Decisions
//! - host.rs and destination.rs are pure and safe to call concurrently
//! - Rules are looked up per request; nothing is cached
//! - Deterministic: same directory state always yields the same URL

pub mod destination;
pub mod host;
pub mod router;

pub use destination::{build_destination, resolve_destination, DestinationUrl, PLACEHOLDER};
pub use host::split_virtual_host;
pub use router::{not_found, VhostRouter, NOT_FOUND_BODY};
