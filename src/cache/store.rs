//! Cache Store Module
//!
//! Typed get/set/delete/enumerate/clear operations layered on the active
//! storage backend, with read-time TTL evaluation, a defensive serialization
//! guard on writes, and scoped invalidation.
//!
//! Expected failures (no usable backend, quota exhausted, corrupt records)
//! never surface as errors: lookups degrade to misses and mutations report
//! plain booleans, so callers can always fall through to fetching fresh data.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::backend::{BackendKind, BackendSelector, FileBackend, MemoryBackend};
use crate::cache::entry::{CacheEnvelope, Clock, SystemClock};
use crate::cache::key::{scope_matches, KEY_SEPARATOR};
use crate::cache::stats::CacheStats;
use crate::config::CacheConfig;

// == Cache Lookup ==
/// Result of a cache lookup.
///
/// A `value` of JSON `null` with `cache_hit` set is a real hit on a stored
/// null; `cache_hit` alone distinguishes hits from misses.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    /// Whether a valid, fresh entry was found
    pub cache_hit: bool,
    /// The cached value on a hit, `None` on a miss
    pub value: Option<Value>,
}

impl CacheLookup {
    fn hit(value: Value) -> Self {
        Self {
            cache_hit: true,
            value: Some(value),
        }
    }

    fn miss() -> Self {
        Self {
            cache_hit: false,
            value: None,
        }
    }
}

// == Cache Store ==
/// Persistent key/value cache over a probed storage backend.
pub struct CacheStore {
    /// Backend selection state (probing, memoization, overrides)
    selector: BackendSelector,
    /// Namespace prefix prepended to every key before it reaches storage
    key_prefix: String,
    /// Time source for write timestamps and freshness checks
    clock: Box<dyn Clock>,
    /// Lookup metrics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructors ==
    /// Creates a store with the standard backend pair: a durable file-backed
    /// store under `config.storage_dir`, falling back to session-scoped
    /// memory if the durable one is unusable.
    pub fn new(config: &CacheConfig) -> Self {
        let backends: Vec<Box<dyn crate::backend::StorageBackend>> = vec![
            Box::new(FileBackend::new(config.storage_dir.join("entries.json"))),
            Box::new(MemoryBackend::new()),
        ];
        let mut selector = BackendSelector::new(backends);
        selector.set_disabled(config.disabled);
        Self::with_selector(config, selector)
    }

    /// Creates a store over an explicitly constructed selector. The selector
    /// is taken as-is; `config` contributes only the key prefix.
    pub fn with_selector(config: &CacheConfig, selector: BackendSelector) -> Self {
        Self {
            selector,
            key_prefix: config.key_prefix.clone(),
            clock: Box::new(SystemClock),
            stats: CacheStats::new(),
        }
    }

    /// Replaces the time source. Production code never needs this; tests use
    /// it to pin the clock for TTL boundaries.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Wraps the store for shared use from interleaved async callers.
    pub fn into_shared(self) -> Arc<RwLock<CacheStore>> {
        Arc::new(RwLock::new(self))
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    // == Get ==
    /// Looks up `key`, returning a hit only for a valid, fresh entry.
    ///
    /// Misses on: no usable backend, absent key, unparseable envelope,
    /// missing or zero timestamp, or elapsed time >= `ttl_seconds`. A stale
    /// entry is left in storage untouched. `None` TTL means "never stale".
    pub async fn get(&mut self, key: &str, ttl_seconds: Option<u64>) -> CacheLookup {
        let namespaced = self.namespaced(key);
        let raw = match self.selector.active_backend() {
            Some(backend) => match backend.read(&namespaced) {
                Ok(raw) => raw,
                Err(err) => {
                    debug!("backend read for '{}' failed, treating as miss: {}", key, err);
                    None
                }
            },
            None => None,
        };

        let Some(raw) = raw else {
            self.stats.record_miss();
            return CacheLookup::miss();
        };

        // Corrupt records are an expected consequence of sharing a storage
        // namespace with out-of-band writers: miss, no warning.
        let envelope = match serde_json::from_str::<CacheEnvelope>(&raw) {
            Ok(envelope) if envelope.is_valid() => envelope,
            _ => {
                self.stats.record_miss();
                return CacheLookup::miss();
            }
        };

        if !envelope.is_fresh(self.clock.now(), ttl_seconds) {
            self.stats.record_miss();
            return CacheLookup::miss();
        }

        self.stats.record_hit();
        CacheLookup::hit(envelope.value)
    }

    // == Set ==
    /// Stores `value` under `key`, stamped with `timestamp_override` or the
    /// current time.
    ///
    /// The candidate envelope is serialized, parsed back, and its value
    /// deep-compared against the original before anything is written; a
    /// value that degrades under serialization is refused rather than left
    /// to mislead later readers. Write failures (quota and the like) are
    /// logged and reported as `false`, never propagated.
    pub async fn set<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        timestamp_override: Option<u64>,
    ) -> bool {
        let value_json = match serde_json::to_value(value) {
            Ok(value_json) => value_json,
            Err(err) => {
                warn!("refusing to cache '{}': value is not serializable: {}", key, err);
                return false;
            }
        };

        let timestamp = timestamp_override.unwrap_or_else(|| self.clock.now());
        let envelope = CacheEnvelope::new(timestamp, value_json);

        let serialized = match serde_json::to_string(&envelope) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!("refusing to cache '{}': envelope serialization failed: {}", key, err);
                return false;
            }
        };

        // Round-trip guard: the stored text must recover the exact value
        match serde_json::from_str::<CacheEnvelope>(&serialized) {
            Ok(recovered) if recovered.value == envelope.value => {}
            _ => {
                warn!(
                    "refusing to cache '{}': value does not survive a serialization round trip",
                    key
                );
                return false;
            }
        }

        let namespaced = self.namespaced(key);
        let Some(backend) = self.selector.active_backend() else {
            return false;
        };
        match backend.write(&namespaced, &serialized) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to cache '{}': {}", key, err);
                false
            }
        }
    }

    // == Delete ==
    /// Removes `key` if present. Returns `false` only when no backend is
    /// usable or the backend rejected the removal; removing an absent key
    /// succeeds.
    pub async fn delete_item(&mut self, key: &str) -> bool {
        let namespaced = self.namespaced(key);
        let Some(backend) = self.selector.active_backend() else {
            return false;
        };
        match backend.remove(&namespaced) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to delete cached '{}': {}", key, err);
                false
            }
        }
    }

    // == Get Keys ==
    /// Lists every cache key in the active backend, with the namespace
    /// prefix stripped. Keys from other occupants of a shared backend are
    /// excluded. Empty when no backend is usable.
    pub async fn get_keys(&mut self) -> Vec<String> {
        let Some(backend) = self.selector.active_backend() else {
            return Vec::new();
        };
        let keys = match backend.enumerate() {
            Ok(keys) => keys,
            Err(err) => {
                debug!("backend enumeration failed: {}", err);
                return Vec::new();
            }
        };
        keys.into_iter()
            .filter_map(|key| key.strip_prefix(&self.key_prefix).map(str::to_owned))
            .collect()
    }

    // == Clear Cache ==
    /// Deletes every cache key. Returns `false` only when no backend was
    /// usable at all; individual delete failures are logged by `delete_item`
    /// and not surfaced.
    pub async fn clear_cache(&mut self) -> bool {
        if self.selector.active_backend().is_none() {
            return false;
        }
        for key in self.get_keys().await {
            let _ = self.delete_item(&key).await;
        }
        true
    }

    // == Invalidate ==
    /// Deletes every key under the scope named by the (possibly partial)
    /// segment tuple. Matching respects segment boundaries, so invalidating
    /// `["core", "sc"]` removes `core::sc` and everything nested below it
    /// but never a sibling like `core::sc-v2`.
    pub async fn invalidate(&mut self, segments: &[&str]) {
        let scope = segments
            .iter()
            .filter(|segment| !segment.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR);

        let mut removed = 0usize;
        for key in self.get_keys().await {
            if scope_matches(&key, &scope) && self.delete_item(&key).await {
                removed += 1;
            }
        }
        debug!("invalidated {} cache entries under scope '{}'", removed, scope);
    }

    // == Stats ==
    /// Returns current lookup metrics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    // == Backend Control ==
    // Test/ops surface only; steady-state callers never touch these.

    /// Force-sets the active backend without probing.
    pub fn set_active_backend(&mut self, kind: BackendKind) {
        self.selector.set_active_backend(kind);
    }

    /// Replaces the backend priority order and forces re-probing.
    pub fn set_backend_priority(&mut self, order: Vec<BackendKind>) {
        self.selector.set_backend_priority(order);
    }

    /// Restores the default backend priority order and forces re-probing.
    pub fn reset_backend_priority(&mut self) {
        self.selector.reset_backend_priority();
    }

    /// Clears the memoized backend selection only.
    pub fn reset_backend(&mut self) {
        self.selector.reset();
    }

    /// Toggles the operator "caching disabled" override. Takes effect on
    /// the next operation; no memoized state needs clearing.
    pub fn set_caching_disabled(&mut self, disabled: bool) {
        self.selector.set_disabled(disabled);
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("key_prefix", &self.key_prefix)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
