//! Routing directory subsystem.
//!
//! # Data Flow
//! ```text
//! tenant key (from the Host header)
//!     → Directory::get(key)
//!         → value stored under key, if any
//!         → otherwise value stored under "default"
//!         → otherwise "" (no upstream)
//!     → raw destination pattern for the resolver
//! ```
//!
//! # Design Decisions
//! - The fallback to `default` lives inside the directory, not the router:
//!   a missing key is never reported as an error
//! - Errors mean transport/protocol failure only; there is no internal retry
//! - Implementations seed `default` with the configured default destination
//!   when they are constructed
//! - Rules are fetched per request and never cached by the caller

pub mod memory;
pub mod redis;

use async_trait::async_trait;

use crate::error::DirectoryError;

pub use self::memory::MemoryDirectory;
pub use self::redis::RedisDirectory;

/// Reserved key holding the fallback destination.
pub const DEFAULT_KEY: &str = "default";

/// Key-value capability mapping tenant keys to raw destination patterns.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up the destination for `key`, falling back to [`DEFAULT_KEY`].
    ///
    /// Returns an empty string when neither `key` nor the default exists.
    async fn get(&self, key: &str) -> Result<String, DirectoryError>;

    /// Release underlying resources. Called once at shutdown.
    async fn close(&self) -> Result<(), DirectoryError>;
}
