//! Redis-backed directory.
//!
//! All rules live in a single hash so the reserved `default` field can sit
//! next to tenant keys: `HGET <hash_key> <tenant>`, and on a nil reply
//! `HGET <hash_key> default`.

use std::sync::{Mutex, PoisonError};

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client};
use async_trait::async_trait;

use crate::config::DirectoryConfig;
use crate::directory::{Directory, DEFAULT_KEY};
use crate::error::DirectoryError;

/// Directory reading rules from a Redis hash.
pub struct RedisDirectory {
    /// `None` once closed.
    conn: Mutex<Option<ConnectionManager>>,
    hash_key: String,
}

impl RedisDirectory {
    /// Connect and seed the `default` field with `default_destination`.
    pub async fn connect(
        config: &DirectoryConfig,
        default_destination: &str,
    ) -> Result<Self, DirectoryError> {
        let addr = format!("{}:{}", config.host, config.port);
        tracing::info!(address = %addr, hash_key = %config.hash_key, "Connecting to Redis");

        let client = Client::open(config.redis_url()).map_err(|source| DirectoryError::Connect {
            addr: addr.clone(),
            source,
        })?;
        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|source| DirectoryError::Connect {
                addr: addr.clone(),
                source,
            })?;

        conn.hset::<_, _, _, ()>(&config.hash_key, DEFAULT_KEY, default_destination)
            .await
            .map_err(|source| DirectoryError::Command {
                command: format!(
                    "HSET {} {} {}",
                    config.hash_key, DEFAULT_KEY, default_destination
                ),
                source,
            })?;

        tracing::info!(address = %addr, "Redis connection established");

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            hash_key: config.hash_key.clone(),
        })
    }

    fn connection(&self) -> Result<ConnectionManager, DirectoryError> {
        self.conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DirectoryError::Closed)
    }

    async fn hget(&self, field: &str) -> Result<Option<String>, DirectoryError> {
        let mut conn = self.connection()?;
        conn.hget::<_, _, Option<String>>(&self.hash_key, field)
            .await
            .map_err(|source| DirectoryError::Command {
                command: format!("HGET {} {}", self.hash_key, field),
                source,
            })
    }
}

#[async_trait]
impl Directory for RedisDirectory {
    async fn get(&self, key: &str) -> Result<String, DirectoryError> {
        if let Some(value) = self.hget(key).await? {
            return Ok(value);
        }
        tracing::debug!(key = %key, "No rule for key, using default");
        Ok(self.hget(DEFAULT_KEY).await?.unwrap_or_default())
    }

    async fn close(&self) -> Result<(), DirectoryError> {
        // Dropping the manager closes the multiplexed connection.
        let conn = self
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if conn.is_some() {
            tracing::info!("Redis connection closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedisDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDirectory")
            .field("hash_key", &self.hash_key)
            .finish_non_exhaustive()
    }
}
