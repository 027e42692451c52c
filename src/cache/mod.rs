//! Cache Module
//!
//! Persistent key/value caching with read-time TTL evaluation, deterministic
//! key construction, and scoped invalidation.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEnvelope, Clock, SystemClock};
pub use key::{build_key, hash_query_params, scope_matches, KEY_SEPARATOR};
pub use stats::CacheStats;
pub use store::{CacheLookup, CacheStore};
