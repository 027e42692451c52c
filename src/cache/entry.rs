//! Cache Envelope Module
//!
//! Defines the persisted wrapper for cache values and the clock used to
//! evaluate freshness.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Envelope ==
/// The `{timestamp, value}` wrapper persisted for every cache entry.
///
/// Entries do not carry a TTL; freshness is evaluated at read time against
/// a caller-supplied TTL. A stored value of `null`, `false`, or `0` is a
/// perfectly valid entry - only the timestamp decides validity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    /// Write time in unix seconds; zero marks an invalid record
    pub timestamp: u64,
    /// The cached value
    pub value: Value,
}

impl CacheEnvelope {
    /// Creates a new envelope written at `timestamp`.
    pub fn new(timestamp: u64, value: Value) -> Self {
        Self { timestamp, value }
    }

    /// Whether this is a valid cache record. Records deserialized from
    /// out-of-band writes may carry a zero timestamp; those are not entries.
    pub fn is_valid(&self) -> bool {
        self.timestamp != 0
    }

    // == Is Fresh ==
    /// Checks freshness at `now` against a caller-supplied TTL.
    ///
    /// Boundary condition: an entry is stale once the elapsed time reaches
    /// the TTL, so `now - timestamp == ttl` is already a miss while
    /// `ttl - 1` is still a hit. A `None` TTL means "never stale".
    pub fn is_fresh(&self, now: u64, ttl_seconds: Option<u64>) -> bool {
        match ttl_seconds {
            Some(ttl) => now.saturating_sub(self.timestamp) < ttl,
            None => true,
        }
    }
}

// == Clock ==
/// Time source for freshness checks and write timestamps.
///
/// Injectable so TTL boundaries can be tested deterministically.
pub trait Clock: Send + Sync {
    /// Current time in unix seconds.
    fn now(&self) -> u64;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // Pre-epoch system time clamps to zero rather than panicking
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_format() {
        let envelope = CacheEnvelope::new(500, json!({"foo": "bar"}));
        let serialized = serde_json::to_string(&envelope).unwrap();
        assert_eq!(serialized, r#"{"timestamp":500,"value":{"foo":"bar"}}"#);
    }

    #[test]
    fn test_envelope_roundtrip() {
        let envelope = CacheEnvelope::new(42, json!([1, "two", null]));
        let serialized = serde_json::to_string(&envelope).unwrap();
        let parsed: CacheEnvelope = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_missing_timestamp_fails_to_parse() {
        let result = serde_json::from_str::<CacheEnvelope>(r#"{"value":"orphan"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timestamp_is_invalid() {
        let envelope = CacheEnvelope::new(0, json!("x"));
        assert!(!envelope.is_valid());
    }

    #[test]
    fn test_falsy_value_is_still_valid() {
        assert!(CacheEnvelope::new(500, json!(null)).is_valid());
        assert!(CacheEnvelope::new(500, json!(false)).is_valid());
        assert!(CacheEnvelope::new(500, json!(0)).is_valid());
    }

    #[test]
    fn test_freshness_boundary() {
        let envelope = CacheEnvelope::new(500, json!(1));

        // Elapsed ttl - 1: still fresh
        assert!(envelope.is_fresh(599, Some(100)));
        // Elapsed exactly ttl: stale
        assert!(!envelope.is_fresh(600, Some(100)));
        assert!(!envelope.is_fresh(700, Some(100)));
    }

    #[test]
    fn test_no_ttl_never_stale() {
        let envelope = CacheEnvelope::new(1, json!(1));
        assert!(envelope.is_fresh(u64::MAX, None));
    }

    #[test]
    fn test_freshness_tolerates_future_timestamp() {
        // Backdated clocks must not underflow
        let envelope = CacheEnvelope::new(1000, json!(1));
        assert!(envelope.is_fresh(500, Some(10)));
    }

    #[test]
    fn test_system_clock_is_plausible() {
        // 2020-01-01 in unix seconds
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
