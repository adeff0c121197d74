//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (host, tenant, destination, error) on every event
//! - Request ID (x-request-id) set by the HTTP layer flows into spans
//! - Metrics are cheap (atomic increments) and off unless enabled

pub mod logging;
pub mod metrics;
