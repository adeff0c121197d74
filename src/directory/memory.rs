//! In-process directory backed by a concurrent map.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::directory::{Directory, DEFAULT_KEY};
use crate::error::DirectoryError;

/// Directory holding its rules in memory.
///
/// Used for static routing tables from the config file and as the
/// deterministic stand-in for Redis in tests.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: DashMap<String, String>,
    closed: AtomicBool,
}

impl MemoryDirectory {
    /// Create a directory whose `default` key holds `default_destination`.
    pub fn new(default_destination: &str) -> Self {
        let directory = Self::default();
        directory.insert(DEFAULT_KEY, default_destination);
        directory
    }

    /// Create a directory seeded with `default_destination` and `entries`.
    pub fn with_entries<I, K, V>(default_destination: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let directory = Self::new(default_destination);
        for (key, value) in entries {
            directory.insert(key, value);
        }
        directory
    }

    /// Add or replace a rule.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a rule. Removing `default` leaves the directory without a fallback.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    /// Number of stored rules, `default` included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn get(&self, key: &str) -> Result<String, DirectoryError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DirectoryError::Closed);
        }

        if let Some(value) = self.entries.get(key) {
            return Ok(value.value().clone());
        }
        Ok(self
            .entries
            .get(DEFAULT_KEY)
            .map(|value| value.value().clone())
            .unwrap_or_default())
    }

    async fn close(&self) -> Result<(), DirectoryError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
