//! Integration tests for the cache over real storage backends.
//!
//! Exercises the full path: backend probing and fallback, the durable file
//! backend's on-disk format, TTL evaluation against a controlled clock, and
//! scoped invalidation of parameterized keys.

use std::collections::BTreeMap;
use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::json;
use tempfile::tempdir;

use stashkit::{build_key, CacheConfig, CacheStore, Clock};

/// Test clock that can be moved forward mid-test.
#[derive(Clone)]
struct SharedClock(Arc<AtomicU64>);

impl SharedClock {
    fn at(seconds: u64) -> Self {
        Self(Arc::new(AtomicU64::new(seconds)))
    }

    fn advance_to(&self, seconds: u64) {
        self.0.store(seconds, Ordering::SeqCst);
    }
}

impl Clock for SharedClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stashkit=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn durable_config(storage_dir: &std::path::Path) -> CacheConfig {
    CacheConfig {
        storage_dir: storage_dir.to_path_buf(),
        ..CacheConfig::default()
    }
}

#[tokio::test]
async fn end_to_end_envelope_scenario() {
    init_tracing();
    let dir = tempdir().unwrap();
    let clock = SharedClock::at(550);
    let mut store =
        CacheStore::new(&durable_config(dir.path())).with_clock(Box::new(clock.clone()));

    assert!(store.set("k", &json!({"foo": "bar"}), Some(500)).await);

    // The durable backend holds the exact namespaced envelope on disk
    let raw = fs::read_to_string(dir.path().join("entries.json")).unwrap();
    let on_disk: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        on_disk.get("stashkit_k").map(String::as_str),
        Some(r#"{"timestamp":500,"value":{"foo":"bar"}}"#)
    );

    // At time 550, 50 of 100 seconds elapsed: hit
    let lookup = store.get("k", Some(100)).await;
    assert!(lookup.cache_hit);
    assert_eq!(lookup.value, Some(json!({"foo": "bar"})));

    // At time 700 the entry is stale: miss, value absent
    clock.advance_to(700);
    let lookup = store.get("k", Some(100)).await;
    assert!(!lookup.cache_hit);
    assert_eq!(lookup.value, None);
}

#[tokio::test]
async fn durable_entries_survive_a_new_store() {
    init_tracing();
    let dir = tempdir().unwrap();
    let config = durable_config(dir.path());

    {
        let mut store = CacheStore::new(&config);
        assert!(store.set("persisted", &json!([1, 2, 3]), None).await);
    }

    let mut reopened = CacheStore::new(&config);
    let lookup = reopened.get("persisted", None).await;
    assert!(lookup.cache_hit);
    assert_eq!(lookup.value, Some(json!([1, 2, 3])));
}

#[tokio::test]
async fn unusable_durable_backend_falls_back_to_session() {
    init_tracing();
    let dir = tempdir().unwrap();

    // Occupy the storage directory path with a plain file so the durable
    // backend cannot create it and fails its probe.
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, "occupied").unwrap();

    let mut store = CacheStore::new(&durable_config(&blocked));

    // Caching still works through the session backend
    assert!(store.set("k", &json!("in memory"), None).await);
    assert!(store.get("k", None).await.cache_hit);

    // And nothing durable was ever written
    assert!(!blocked.join("entries.json").exists());
}

#[tokio::test]
async fn disabled_config_short_circuits_all_operations() {
    init_tracing();
    let dir = tempdir().unwrap();
    let config = CacheConfig {
        disabled: true,
        ..durable_config(dir.path())
    };

    let mut store = CacheStore::new(&config);

    assert!(!store.set("k", &json!(1), None).await);
    assert!(!store.get("k", None).await.cache_hit);
    assert!(!store.delete_item("k").await);
    assert!(store.get_keys().await.is_empty());
    assert!(!store.clear_cache().await);
}

#[tokio::test]
async fn invalidation_covers_parameterized_keys_on_disk() {
    init_tracing();
    let dir = tempdir().unwrap();
    let mut store = CacheStore::new(&durable_config(dir.path()));

    let accounts = build_key("core", "sc", "accounts", None);
    let users = build_key("core", "sc", "users", None);
    let users_paged = build_key("core", "sc", "users", Some(&json!({"page": 2})));

    assert!(store.set(&accounts, &json!("a"), None).await);
    assert!(store.set(&users, &json!("u"), None).await);
    assert!(store.set(&users_paged, &json!("u2"), None).await);

    // Datapoint scope removes the bare key and its parameterized variant
    store.invalidate(&["core", "sc", "users"]).await;
    assert!(store.get(&accounts, None).await.cache_hit);
    assert!(!store.get(&users, None).await.cache_hit);
    assert!(!store.get(&users_paged, None).await.cache_hit);

    // Identifier scope removes the rest
    store.invalidate(&["core", "sc"]).await;
    assert!(!store.get(&accounts, None).await.cache_hit);
    assert!(store.get_keys().await.is_empty());
}

#[tokio::test]
async fn invalidation_spares_sibling_scopes() {
    init_tracing();
    let dir = tempdir().unwrap();
    let mut store = CacheStore::new(&durable_config(dir.path()));

    let original = build_key("core", "search-console", "users", None);
    let sibling = build_key("core", "search-console-v2", "users", None);

    assert!(store.set(&original, &json!(1), None).await);
    assert!(store.set(&sibling, &json!(2), None).await);

    store.invalidate(&["core", "search-console"]).await;

    assert!(!store.get(&original, None).await.cache_hit);
    assert!(store.get(&sibling, None).await.cache_hit);
}

#[tokio::test]
async fn clear_cache_spares_foreign_occupants_of_the_backend() {
    init_tracing();
    let dir = tempdir().unwrap();
    let config = durable_config(dir.path());

    {
        let mut store = CacheStore::new(&config);
        assert!(store.set("mine", &json!(1), None).await);
    }

    // Another occupant of the shared storage file, outside our namespace
    let path = dir.path().join("entries.json");
    let mut on_disk: BTreeMap<String, String> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    on_disk.insert("other_plugin_key".to_string(), "their data".to_string());
    fs::write(&path, serde_json::to_string(&on_disk).unwrap()).unwrap();

    let mut store = CacheStore::new(&config);
    assert_eq!(store.get_keys().await, vec!["mine".to_string()]);
    assert!(store.clear_cache().await);

    let on_disk: BTreeMap<String, String> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(on_disk.contains_key("other_plugin_key"));
    assert!(!on_disk.contains_key("stashkit_mine"));
}

#[tokio::test]
async fn out_of_band_corruption_reads_as_miss() {
    init_tracing();
    let dir = tempdir().unwrap();
    let config = durable_config(dir.path());

    {
        let mut store = CacheStore::new(&config);
        assert!(store.set("victim", &json!("ok"), None).await);
    }

    // Corrupt the stored envelope out of band
    let path = dir.path().join("entries.json");
    let mut on_disk: BTreeMap<String, String> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    on_disk.insert("stashkit_victim".to_string(), "{truncated".to_string());
    fs::write(&path, serde_json::to_string(&on_disk).unwrap()).unwrap();

    let mut store = CacheStore::new(&config);
    let lookup = store.get("victim", None).await;
    assert!(!lookup.cache_hit);
    assert_eq!(lookup.value, None);
}

#[tokio::test]
async fn shared_store_serves_interleaved_callers() {
    init_tracing();
    let dir = tempdir().unwrap();
    let shared = CacheStore::new(&durable_config(dir.path())).into_shared();

    let writer = {
        let shared = shared.clone();
        tokio::spawn(async move {
            let mut store = shared.write().await;
            store.set("shared-key", &json!({"n": 42}), None).await
        })
    };
    assert!(writer.await.unwrap());

    let reader = {
        let shared = shared.clone();
        tokio::spawn(async move {
            let mut store = shared.write().await;
            store.get("shared-key", None).await
        })
    };
    let lookup = reader.await.unwrap();
    assert!(lookup.cache_hit);
    assert_eq!(lookup.value, Some(json!({"n": 42})));
}
