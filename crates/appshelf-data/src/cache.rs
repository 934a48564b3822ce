//! # TTL Cache
//!
//! Keyed store of fetched payloads with time-bounded freshness.
//!
//! ## Lifecycle of an Entry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  set(key)          get_fresh(key)            get_fresh(key)             │
//! │     │                   │                         │                     │
//! │     ▼                   ▼                         ▼                     │
//! │  fetched_at ──────── now < fetched_at + ttl ──── now ≥ fetched_at + ttl │
//! │                      → Some(payload)             → None (stale)         │
//! │                                                    entry stays until    │
//! │                                                    the next set(key)    │
//! │                                                                         │
//! │  No background eviction: freshness is checked when read.               │
//! │  Capacity bound: inserting a NEW key into a full cache evicts the      │
//! │  least recently accessed entry.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The clock is `tokio::time::Instant`, so tests can pause and advance time.
//! The lock is a plain `std::sync::Mutex`; it is never held across `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::{CacheSettings, DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS};

/// One cached payload.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub payload: V,
    pub fetched_at: Instant,
    pub ttl: Duration,
    last_accessed: Instant,
}

impl<V> CacheEntry<V> {
    /// Fresh while strictly less than `ttl` has elapsed since the fetch.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }
}

/// Thread-safe TTL cache with an LRU bound.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
}

/// Cache shared by every hook of one [`crate::Catalog`].
pub type SharedCache<V> = Arc<TtlCache<V>>;

impl<V: Clone> TtlCache<V> {
    /// Creates a cache with the given TTL and the default capacity.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_ENTRIES)
    }

    /// Creates a cache with an explicit capacity (minimum 1).
    pub fn with_capacity(ttl: Duration, max_entries: usize) -> Self {
        TtlCache {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::with_capacity(settings.ttl(), settings.max_entries)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the entry for `key`, fresh or not.
    pub fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        let mut entries = self.lock();
        let entry = entries.get_mut(key)?;
        entry.last_accessed = Instant::now();
        Some(entry.clone())
    }

    /// False when absent, else whether the entry is still within its TTL.
    pub fn is_fresh(&self, key: &str) -> bool {
        self.lock().get(key).is_some_and(|e| e.is_fresh())
    }

    /// Returns the payload only if it is still fresh.
    pub fn get_fresh(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();
        let entry = entries.get_mut(key)?;

        if !entry.is_fresh_at(now) {
            trace!(key, "Cache entry stale");
            return None;
        }

        entry.last_accessed = now;
        Some(entry.payload.clone())
    }

    /// Stores `payload` under `key` with `fetched_at = now`.
    ///
    /// Overwrites any previous entry (last write wins).
    pub fn set(&self, key: impl Into<String>, payload: V) {
        let key = key.into();
        let now = Instant::now();
        let mut entries = self.lock();

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            evict_least_recent(&mut entries);
        }

        entries.insert(
            key.clone(),
            CacheEntry {
                key,
                payload,
                fetched_at: now,
                ttl: self.ttl,
                last_accessed: now,
            },
        );
    }

    /// Drops one key. Returns whether it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drops every key starting with `prefix`. Returns how many were dropped.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        let dropped = before - entries.len();
        if dropped > 0 {
            debug!(prefix, dropped, "Invalidated cache entries");
        }
        dropped
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().expect("Cache mutex poisoned")
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

fn evict_least_recent<V>(entries: &mut HashMap<String, CacheEntry<V>>) {
    let oldest = entries
        .values()
        .min_by_key(|e| e.last_accessed)
        .map(|e| e.key.clone());

    if let Some(key) = oldest {
        debug!(key = %key, "Evicting least recently used cache entry");
        entries.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_is_not_fresh() {
        let cache: TtlCache<u32> = TtlCache::default();
        assert!(!cache.is_fresh("missing"));
        assert!(cache.get("missing").is_none());
        assert!(cache.get_fresh("missing").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_goes_stale_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.set("application:{}", 7u32);

        assert!(cache.is_fresh("application:{}"));
        assert_eq!(cache.get_fresh("application:{}"), Some(7));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.is_fresh("application:{}"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!cache.is_fresh("application:{}"));
        assert_eq!(cache.get_fresh("application:{}"), None);

        // stale entries are kept until overwritten
        let entry = cache.get("application:{}").unwrap();
        assert_eq!(entry.payload, 7);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_timestamp() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set("k", 1u32);
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k", 2u32);
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get_fresh("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lru_eviction_when_full() {
        let cache = TtlCache::with_capacity(Duration::from_secs(60), 2);
        cache.set("a", 1u32);
        tokio::time::advance(Duration::from_millis(1)).await;
        cache.set("b", 2u32);
        tokio::time::advance(Duration::from_millis(1)).await;

        // touch "a" so "b" becomes least recently used
        assert_eq!(cache.get_fresh("a"), Some(1));
        tokio::time::advance(Duration::from_millis(1)).await;

        cache.set("c", 3u32);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get_fresh("a"), Some(1));
        assert_eq!(cache.get_fresh("c"), Some(3));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let cache = TtlCache::with_capacity(Duration::from_secs(60), 1);
        cache.set("a", 1u32);
        cache.set("a", 2u32);
        assert_eq!(cache.get_fresh("a"), Some(2));
    }

    #[test]
    fn test_invalidation() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("favorites:u1", 1u32);
        cache.set("favorites:u2", 2u32);
        cache.set("post:p1", 3u32);

        assert!(cache.invalidate("post:p1"));
        assert!(!cache.invalidate("post:p1"));
        assert_eq!(cache.invalidate_prefix("favorites:"), 2);
        assert!(cache.is_empty());

        cache.set("x", 4u32);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
