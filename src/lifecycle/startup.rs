//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect the directory and seed its default rule
//! - Initialize the forwarder and router in dependency order
//! - Bind the listener and begin accepting traffic
//! - Close the directory once the server has drained
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{DirectoryBackend, ProxyConfig};
use crate::directory::{Directory, MemoryDirectory, RedisDirectory};
use crate::error::StartupError;
use crate::forward::Forwarder;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::routing::VhostRouter;

/// Open the configured directory backend.
pub async fn connect_directory(config: &ProxyConfig) -> Result<Arc<dyn Directory>, StartupError> {
    let default_destination = &config.routing.default_dest_url;

    match config.directory.backend {
        DirectoryBackend::Redis => {
            let directory = RedisDirectory::connect(&config.directory, default_destination)
                .await
                .map_err(StartupError::DirectoryConnect)?;
            Ok(Arc::new(directory))
        }
        DirectoryBackend::Memory => {
            let directory = MemoryDirectory::with_entries(
                default_destination,
                config
                    .directory
                    .entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            );
            tracing::info!(rules = directory.len(), "Using in-memory directory");
            Ok(Arc::new(directory))
        }
    }
}

/// Build the forwarder and the router around an open directory.
pub fn build_router(
    config: &ProxyConfig,
    directory: Arc<dyn Directory>,
) -> Result<Arc<VhostRouter>, StartupError> {
    let forwarder = Forwarder::new(&config.forwarder)?;
    tracing::info!(mode = ?forwarder.mode(), "Forwarder initialized");
    Ok(Arc::new(VhostRouter::new(config, directory, forwarder)))
}

/// Bind the configured listen address.
pub async fn bind(config: &ProxyConfig) -> Result<TcpListener, StartupError> {
    let addr = config.listener.bind_address();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })
}

/// Serve on `listener` until `shutdown` fires, then close the directory.
pub async fn serve<F>(
    router: Arc<VhostRouter>,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let directory = Arc::clone(router.directory());
    let served = HttpServer::new(router)
        .run(listener, shutdown)
        .await
        .map_err(StartupError::Serve);

    match directory.close().await {
        Ok(()) => tracing::info!("Directory closed"),
        Err(e) => tracing::warn!(error = %e, "Failed to close directory"),
    }
    served
}

/// Full startup sequence: directory, forwarder, router, listener, serve.
pub async fn run(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let signalled = shutdown.signalled();
    let directory = connect_directory(&config).await?;
    let router = match build_router(&config, Arc::clone(&directory)) {
        Ok(router) => router,
        Err(e) => {
            let _ = directory.close().await;
            return Err(e);
        }
    };
    let listener = match bind(&config).await {
        Ok(listener) => listener,
        Err(e) => {
            let _ = directory.close().await;
            return Err(e);
        }
    };

    tracing::info!(
        address = %config.listener.bind_address(),
        base_domain = %config.routing.base_domain,
        "Proxy listening"
    );
    serve(router, listener, signalled).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.routing.base_domain = "mirror.test".into();
        config.routing.default_dest_url = "fallback.internal".into();
        config.directory.backend = DirectoryBackend::Memory;
        config
            .directory
            .entries
            .insert("app".into(), "app.internal:8080".into());
        config
    }

    #[tokio::test]
    async fn test_memory_directory_is_seeded() {
        let directory = connect_directory(&memory_config()).await.unwrap();
        assert_eq!(directory.get("app").await.unwrap(), "app.internal:8080");
        assert_eq!(directory.get("other").await.unwrap(), "fallback.internal");
    }

    #[tokio::test]
    async fn test_invalid_forwarder_config_fails_startup() {
        let mut config = memory_config();
        config.forwarder.connect_timeout_secs = 0;
        let directory = connect_directory(&config).await.unwrap();

        let err = build_router(&config, directory).err().unwrap();
        assert!(matches!(err, StartupError::ForwarderInit(_)));
    }

    #[tokio::test]
    async fn test_serve_closes_directory_after_shutdown() {
        let config = memory_config();
        let directory = connect_directory(&config).await.unwrap();
        let router = build_router(&config, Arc::clone(&directory)).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let shutdown = Shutdown::new();
        let handle = tokio::spawn(serve(router, listener, shutdown.signalled()));
        shutdown.trigger();

        handle.await.unwrap().unwrap();
        assert!(directory.get("app").await.is_err());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = memory_config();
        config.listener.host = "127.0.0.1".into();
        config.listener.port = taken.local_addr().unwrap().port();

        let err = bind(&config).await.unwrap_err();
        assert!(matches!(err, StartupError::Bind { .. }));
    }
}
