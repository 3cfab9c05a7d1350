//! Keyed lock registry
//!
//! Serializes remote calls that mutate the same parent resource (e.g. two
//! definition updates against one pipeline). One async mutex per key,
//! created on first use and kept for the life of the registry.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of named mutexes, shared by cloning the handle
#[derive(Debug, Clone, Default)]
pub struct MutexKv {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Holds the lock for one key until dropped
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    _guard: OwnedMutexGuard<()>,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        log::debug!("Unlocked {}", self.key);
    }
}

impl MutexKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the lock on `key` and hold it until the guard is dropped
    pub async fn lock(&self, key: &str) -> KeyGuard {
        log::debug!("Locking {}", key);
        let mutex = self.get(key);
        let guard = mutex.lock_owned().await;
        log::debug!("Locked {}", key);
        KeyGuard {
            key: key.to_string(),
            _guard: guard,
        }
    }

    /// Number of keys that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn get(&self, key: &str) -> Arc<Mutex<()>> {
        // The map shard guard must be released before awaiting the mutex
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}
