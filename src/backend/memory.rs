//! In-Memory Backend
//!
//! Session-scoped storage adapter: entries live only as long as the process.
//! An optional byte budget models the quota behavior of host storage, which
//! gives the prober and the store's quota-failure path something real to hit.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::backend::{BackendKind, StorageBackend};
use crate::error::{BackendError, Result};

// == Memory Backend ==
/// Session-scoped key/value storage held in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Raw key-to-string storage
    entries: Mutex<HashMap<String, String>>,
    /// Maximum total bytes (keys + values), None = unbounded
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    /// Creates an unbounded in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an in-memory backend that rejects writes once the combined
    /// size of keys and values would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still structurally valid string data
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Session
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock();

        if let Some(quota) = self.quota_bytes {
            // Size after the write, exempting the entry being overwritten
            let occupied: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if occupied + key.len() + value.len() > quota {
                return Err(BackendError::QuotaExceeded);
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn enumerate(&self) -> Result<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}
