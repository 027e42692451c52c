//! Storage Backend Module
//!
//! Defines the polymorphic storage interface the cache is built on, the
//! concrete adapters for each host mechanism, and the runtime prober that
//! decides which mechanism is actually usable.

mod file;
mod memory;
mod selector;

use tracing::debug;

use crate::error::{BackendError, Result};

// Re-export public types
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use selector::BackendSelector;

// == Public Constants ==
/// Sentinel key used by the prober's write-then-remove check.
pub const PROBE_KEY: &str = "__stashkit_probe__";

/// Default backend priority: durable storage before session-scoped storage.
pub const DEFAULT_BACKEND_PRIORITY: [BackendKind; 2] = [BackendKind::Durable, BackendKind::Session];

// == Backend Kind ==
/// Identifies a storage mechanism in the priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Survives process restarts (file-backed)
    Durable,
    /// Lives only as long as the process (in-memory)
    Session,
}

// == Storage Backend Trait ==
/// Capability set every storage mechanism must provide.
///
/// Calls are synchronous; the cache store wraps them in its async surface.
/// All values are stored as already-serialized JSON strings, so a backend
/// never needs to understand the envelope format.
pub trait StorageBackend: Send + Sync {
    /// Which mechanism this adapter wraps.
    fn kind(&self) -> BackendKind;

    /// Reads the raw string stored under `key`, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key`, overwriting any existing entry.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key` if present. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Lists every key currently held by the backend, in no particular order.
    fn enumerate(&self) -> Result<Vec<String>>;
}

// == Prober ==
/// Checks whether a backend can be written to and read from right now.
///
/// Attempts a trivial write-then-remove of a sentinel key. Every failure
/// path resolves to `false`; this function never panics and never returns
/// an error. A quota failure with entries already present is still reported
/// as unavailable - callers get a plain boolean either way.
pub fn probe(backend: &dyn StorageBackend) -> bool {
    match backend
        .write(PROBE_KEY, "1")
        .and_then(|()| backend.remove(PROBE_KEY))
    {
        Ok(()) => true,
        Err(BackendError::QuotaExceeded) => {
            let occupied = backend
                .enumerate()
                .map(|keys| !keys.is_empty())
                .unwrap_or(false);
            debug!(
                "probe of {:?} backend failed: quota exceeded (occupied: {})",
                backend.kind(),
                occupied
            );
            false
        }
        Err(err) => {
            debug!("probe of {:?} backend failed: {}", backend.kind(), err);
            false
        }
    }
}
