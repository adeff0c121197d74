//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs (flags / environment override file values)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed by reference to the router and its collaborators
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never mutated afterwards
//! - All fields have defaults except the base domain, which is required
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use schema::DirectoryBackend;
pub use schema::DirectoryConfig;
pub use schema::ForwarderConfig;
pub use schema::ListenerConfig;
pub use schema::ProxyConfig;
pub use schema::RoutingConfig;
