//! Cache Key Module
//!
//! Deterministic key construction and the segment-boundary matching rule
//! that makes prefix-based invalidation safe.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Separator between key segments. Also the boundary marker for scoped
/// invalidation: a scope matches a key only at a separator boundary.
pub const KEY_SEPARATOR: &str = "::";

// == Build Key ==
/// Builds a deterministic cache key from namespace segments.
///
/// Empty segments are omitted. When all three segments are present and
/// `query_params` is a non-empty JSON object, a content hash of the
/// canonicalized (key-sorted) params is appended as one more segment; any
/// other `query_params` shape contributes nothing. The unhashed key is
/// therefore always a strict prefix of the hashed one, which is what makes
/// prefix invalidation cover parameterized variants.
///
/// # Arguments
/// * `group` - Top-level namespace (e.g. a module family)
/// * `identifier` - The entity within the group
/// * `datapoint` - The specific datum cached for that entity
/// * `query_params` - Optional structured parameters distinguishing variants
pub fn build_key(
    group: &str,
    identifier: &str,
    datapoint: &str,
    query_params: Option<&Value>,
) -> String {
    let segments: Vec<&str> = [group, identifier, datapoint]
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect();
    let mut key = segments.join(KEY_SEPARATOR);

    // Only a key at its most specific scope gets a params segment
    if segments.len() == 3 {
        if let Some(params) = query_params {
            if let Value::Object(map) = params {
                if !map.is_empty() {
                    key.push_str(KEY_SEPARATOR);
                    key.push_str(&hash_query_params(params));
                }
            }
        }
    }

    key
}

// == Query Param Hashing ==
/// Hashes a structured parameter object into a key segment.
///
/// Logically-equal objects (same keys and values, any property order, at
/// any nesting depth) produce the same digest.
pub fn hash_query_params(params: &Value) -> String {
    let canonical = canonicalize(params).to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Rebuilds a JSON value with object keys inserted in sorted order, so its
/// serialized form is property-order independent. Array order is meaningful
/// and preserved.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            let mut sorted = serde_json::Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

// == Scope Matching ==
/// Whether `key` falls under the invalidation `scope`.
///
/// Matches the key itself and anything nested below it, but never a sibling
/// that merely shares the scope as a string prefix: scope `a::b` matches
/// `a::b` and `a::b::c`, not `a::bc`. An empty scope matches every key.
pub fn scope_matches(key: &str, scope: &str) -> bool {
    if scope.is_empty() {
        return true;
    }
    if key == scope {
        return true;
    }
    match key.strip_prefix(scope) {
        Some(rest) => rest.starts_with(KEY_SEPARATOR),
        None => false,
    }
}
