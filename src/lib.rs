//! stashkit - a persistent key/value cache with pluggable storage backends
//!
//! Provides TTL-scoped caching over whichever host storage mechanism is
//! usable at runtime, with deterministic key construction and prefix-based
//! invalidation. Expected failure modes (no usable backend, quota exhausted,
//! corrupt records) degrade to misses and `false` returns; the library never
//! raises them to callers.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;

pub use backend::{BackendKind, BackendSelector, FileBackend, MemoryBackend, StorageBackend};
pub use cache::{
    build_key, CacheEnvelope, CacheLookup, CacheStats, CacheStore, Clock, SystemClock,
    KEY_SEPARATOR,
};
pub use config::CacheConfig;
pub use error::BackendError;
