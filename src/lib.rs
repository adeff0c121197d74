//! Virtual host mirror: a reverse proxy that routes on the Host header.

pub mod config;
pub mod directory;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use directory::{Directory, MemoryDirectory, RedisDirectory};
pub use error::{DirectoryError, ResolveError, StartupError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::VhostRouter;
