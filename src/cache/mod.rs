//! In-memory response cache shared by the service adapters.
//!
//! Entries are immutable JSON snapshots with their own expiry. A read of an
//! expired entry evicts it and counts as a miss; nothing refreshes entries in
//! the background.

use moka::future::Cache;
use moka::ops::compute::Op;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const DEFAULT_MAX_CAPACITY: u64 = 1_000;

/// Longest time an entry may live; longer TTLs are clamped to this.
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Names of the stores created by [`CacheManager::new`].
pub const RADARR_CACHE: &str = "radarr";
pub const SONARR_CACHE: &str = "sonarr";

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<Value>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub keys: u64,
}

/// A named keyed store mapping a cache key to a JSON value and its expiry.
#[derive(Debug)]
pub struct CacheStore {
    name: String,
    entries: Cache<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStore {
    pub fn new(name: impl Into<String>, max_capacity: u64) -> Self {
        Self {
            name: name.into(),
            entries: Cache::builder().max_capacity(max_capacity).build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the live value stored under `key`, if any.
    pub async fn get(&self, key: &str) -> Option<Arc<Value>> {
        match self.entries.get(key).await {
            Some(entry) if entry.is_live(Instant::now()) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(cache = %self.name, key, "Cache hit");
                Some(entry.value)
            }
            Some(_) => {
                self.evict_if_expired(key).await;
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(cache = %self.name, key, "Cache entry expired");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(cache = %self.name, key, "Cache miss");
                None
            }
        }
    }

    /// Stores `value` under `key` for `ttl` (at most [`MAX_TTL`]), replacing
    /// any previous entry.
    pub async fn insert(&self, key: String, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            value: Arc::new(value),
            expires_at: Instant::now() + ttl.min(MAX_TTL),
        };
        self.entries.insert(key, entry).await;
    }

    /// Removes the entry under `key` only while it is still expired, so a
    /// fresh entry written concurrently survives.
    async fn evict_if_expired(&self, key: &str) {
        self.entries
            .entry_by_ref(key)
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if !entry.value().is_live(Instant::now()) => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
    }

    pub async fn flush(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        info!(cache = %self.name, "Cache flushed");
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let keys = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .count() as u64;

        CacheStats {
            name: self.name.clone(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            keys,
        }
    }
}

/// Process-wide registry of named cache stores.
#[derive(Debug, Clone)]
pub struct CacheManager {
    stores: BTreeMap<String, Arc<CacheStore>>,
}

impl CacheManager {
    pub fn new() -> Self {
        Self::with_stores(&[RADARR_CACHE, SONARR_CACHE])
    }

    pub fn with_stores(names: &[&str]) -> Self {
        let stores = names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    Arc::new(CacheStore::new(*name, DEFAULT_MAX_CAPACITY)),
                )
            })
            .collect();

        Self { stores }
    }

    pub fn get(&self, name: &str) -> Option<Arc<CacheStore>> {
        self.stores.get(name).cloned()
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<CacheStore>> {
        self.stores.values()
    }

    pub fn stats(&self) -> Vec<CacheStats> {
        self.all().map(|store| store.stats()).collect()
    }

    /// Flushes one store. Returns `false` when no store has that name.
    pub async fn flush(&self, name: &str) -> bool {
        match self.stores.get(name) {
            Some(store) => {
                store.flush().await;
                true
            }
            None => false,
        }
    }

    pub async fn flush_all(&self) {
        for store in self.stores.values() {
            store.flush().await;
        }
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn live_entry_is_a_hit() {
        let store = CacheStore::new("test", 10);
        store
            .insert("k".to_string(), json!([1, 2]), Duration::from_secs(60))
            .await;

        let value = store.get("k").await.unwrap();
        assert_eq!(*value, json!([1, 2]));

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.keys, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_evicted_on_read() {
        let store = CacheStore::new("test", 10);
        store
            .insert("k".to_string(), json!("v"), Duration::from_millis(20))
            .await;

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(store.get("k").await.is_none());
        let stats = store.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.keys, 0);
    }

    #[tokio::test]
    async fn huge_ttl_is_clamped() {
        let store = CacheStore::new("test", 10);
        store
            .insert("k".to_string(), json!(1), Duration::from_secs(u64::MAX))
            .await;

        assert_eq!(*store.get("k").await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn eviction_keeps_a_fresh_replacement() {
        let store = CacheStore::new("test", 10);
        store
            .insert("k".to_string(), json!("old"), Duration::from_millis(20))
            .await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        store
            .insert("k".to_string(), json!("new"), Duration::from_secs(60))
            .await;

        store.evict_if_expired("k").await;

        assert_eq!(*store.get("k").await.unwrap(), json!("new"));
    }

    #[tokio::test]
    async fn eviction_removes_a_stale_entry() {
        let store = CacheStore::new("test", 10);
        store
            .insert("k".to_string(), json!("old"), Duration::from_millis(20))
            .await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        store.evict_if_expired("k").await;

        assert_eq!(store.entries.iter().count(), 0);
    }

    #[tokio::test]
    async fn insert_replaces_existing_entry() {
        let store = CacheStore::new("test", 10);
        store
            .insert("k".to_string(), json!(1), Duration::from_secs(60))
            .await;
        store
            .insert("k".to_string(), json!(2), Duration::from_secs(60))
            .await;

        assert_eq!(*store.get("k").await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn manager_flushes_named_store() {
        let manager = CacheManager::new();
        let radarr = manager.get(RADARR_CACHE).unwrap();
        radarr
            .insert("k".to_string(), json!(true), Duration::from_secs(60))
            .await;

        assert!(manager.flush(RADARR_CACHE).await);
        assert!(!manager.flush("tmdb").await);
        assert!(radarr.get("k").await.is_none());
    }

    #[test]
    fn manager_creates_default_stores() {
        let manager = CacheManager::new();
        let names: Vec<_> = manager.stats().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["radarr".to_string(), "sonarr".to_string()]);
    }
}
