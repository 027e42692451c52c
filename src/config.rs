//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Default prefix prepended to every key before it reaches a backend.
pub const DEFAULT_KEY_PREFIX: &str = "stashkit_";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Namespace prefix prepended to every stored key
    pub key_prefix: String,
    /// Operator override: disables all caching when true
    pub disabled: bool,
    /// Directory where the durable backend keeps its state
    pub storage_dir: PathBuf,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STASHKIT_KEY_PREFIX` - Namespace prefix (default: "stashkit_")
    /// - `STASHKIT_CACHE_DISABLED` - Set to "1" or "true" to disable caching
    /// - `STASHKIT_STORAGE_DIR` - Durable backend directory (default: system temp dir)
    pub fn from_env() -> Self {
        Self {
            key_prefix: env::var("STASHKIT_KEY_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
            disabled: env::var("STASHKIT_CACHE_DISABLED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            storage_dir: env::var("STASHKIT_STORAGE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_storage_dir),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            disabled: false,
            storage_dir: default_storage_dir(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    env::temp_dir().join("stashkit")
}
