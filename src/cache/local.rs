//! Local (L1) tier: bounded, in-process cache with LRU eviction and TTL expiry

use crate::cache::entry::CacheEntry;
use crate::cache::types::{CacheKey, CacheStats, CacheValue};
use crate::error::{CacheError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Bounded in-process cache.
///
/// - TTL expiry is checked lazily on every read; the maintenance sweep
///   reclaims entries that are never re-read
/// - LRU eviction keeps the entry count at or below capacity
/// - Thread-safe via an async `RwLock`; no lock is ever held across I/O
pub struct LocalCache {
    capacity: usize,
    store: Arc<RwLock<LocalStore>>,
}

/// Internal cache storage
struct LocalStore {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry>,

    /// Access-ordered queue: front is the least recently used key.
    /// Keys never read since insertion keep their insertion order, which is
    /// exactly the eviction tie-break.
    lru_queue: VecDeque<CacheKey>,

    /// Current cache statistics
    stats: CacheStats,

    /// Approximate total size of cached data in bytes
    current_size_bytes: usize,
}

impl LocalCache {
    /// Create a new local cache with the given entry capacity
    pub fn new(capacity: usize) -> Self {
        info!("Initializing local cache (capacity: {})", capacity);

        let store = LocalStore {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            stats: CacheStats {
                capacity,
                ..CacheStats::default()
            },
            current_size_bytes: 0,
        };

        Self {
            capacity,
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Get a value from the cache.
    ///
    /// Expired entries are removed on the spot and counted as a miss.
    /// A valid hit updates the entry's access metadata and LRU position.
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        let mut store = self.store.write().await;

        if let Some(entry) = store.entries.get(key) {
            if entry.is_expired() {
                debug!("Local entry expired: {}", key);
                store.stats.misses += 1;
                store.stats.evictions_ttl += 1;
                Self::remove_entry(&mut store, key);
                return None;
            }

            let value = entry.value.clone();

            if let Some(entry) = store.entries.get_mut(key) {
                entry.mark_accessed();
            }
            store.stats.hits += 1;

            // Move to the back of the queue (most recently used)
            store.lru_queue.retain(|k| k != key);
            store.lru_queue.push_back(key.to_string());

            debug!("Local cache hit: {}", key);
            Some(value)
        } else {
            debug!("Local cache miss: {}", key);
            store.stats.misses += 1;
            None
        }
    }

    /// Insert or overwrite a value.
    ///
    /// Rejects a zero TTL with [`CacheError::InvalidTtl`]. Inserting a new
    /// key at capacity first evicts the least recently used entry;
    /// overwriting an existing key never evicts.
    pub async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl { ttl });
        }

        let entry = CacheEntry::new(key.to_string(), value, ttl);
        let size = entry.metadata.size_bytes;

        let mut store = self.store.write().await;

        if let Some(existing) = store.entries.get_mut(key) {
            debug!("Updating local entry: {}", key);
            let old_size = existing.metadata.size_bytes;
            *existing = entry;
            store.current_size_bytes = store.current_size_bytes.saturating_sub(old_size) + size;
            store.lru_queue.retain(|k| k != key);
            store.lru_queue.push_back(key.to_string());
        } else {
            while store.entries.len() >= self.capacity {
                match store.lru_queue.pop_front() {
                    Some(victim) => {
                        debug!("Evicting least recently used entry: {}", victim);
                        if let Some(evicted) = store.entries.remove(&victim) {
                            store.current_size_bytes = store
                                .current_size_bytes
                                .saturating_sub(evicted.metadata.size_bytes);
                        }
                        store.stats.evictions_size += 1;
                    }
                    None => break,
                }
            }

            debug!("Inserting local entry: {}", key);
            store.entries.insert(key.to_string(), entry);
            store.lru_queue.push_back(key.to_string());
            store.current_size_bytes += size;
        }

        store.stats.sets += 1;
        store.stats.entries = store.entries.len();
        store.stats.size_bytes = store.current_size_bytes;

        Ok(())
    }

    /// Remove a specific entry. Returns whether the key was present.
    pub async fn delete(&self, key: &str) -> bool {
        let mut store = self.store.write().await;

        let removed = Self::remove_entry(&mut store, key);
        if removed {
            store.stats.deletes += 1;
            debug!("Deleted local entry: {}", key);
        }
        removed
    }

    /// Clear all entries. Returns the number removed.
    pub async fn clear(&self) -> usize {
        let mut store = self.store.write().await;

        let count = store.entries.len();
        store.entries.clear();
        store.lru_queue.clear();
        store.current_size_bytes = 0;
        store.stats.entries = 0;
        store.stats.size_bytes = 0;

        info!("Cleared {} entries from local cache", count);
        count
    }

    /// Remove all expired entries. Returns the number reclaimed.
    pub async fn purge_expired(&self) -> usize {
        let mut store = self.store.write().await;

        let expired_keys: Vec<CacheKey> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            Self::remove_entry(&mut store, key);
        }

        if !expired_keys.is_empty() {
            store.stats.evictions_ttl += expired_keys.len() as u64;
            debug!("Purged {} expired local entries", expired_keys.len());
        }

        expired_keys.len()
    }

    /// Remove every entry whose key contains `pattern` as a substring.
    ///
    /// The local tier has no native glob support; substring matching is the
    /// documented minimum-viable invalidation policy.
    pub async fn invalidate_substring(&self, pattern: &str) -> usize {
        let mut store = self.store.write().await;

        let matching: Vec<CacheKey> = store
            .entries
            .keys()
            .filter(|key| key.contains(pattern))
            .cloned()
            .collect();

        for key in &matching {
            Self::remove_entry(&mut store, key);
        }

        store.stats.invalidations += matching.len() as u64;
        info!(
            "Invalidated {} local entries matching '{}'",
            matching.len(),
            pattern
        );

        matching.len()
    }

    /// Check if a key is present (without updating access metadata)
    pub async fn contains_key(&self, key: &str) -> bool {
        let store = self.store.read().await;
        store.entries.contains_key(key)
    }

    /// Number of entries in the cache
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.entries.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        let store = self.store.read().await;
        store.entries.is_empty()
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let mut stats = store.stats.clone();
        stats.entries = store.entries.len();
        stats.size_bytes = store.current_size_bytes;
        stats
    }

    /// Internal: remove an entry and fix up queue and size accounting
    fn remove_entry(store: &mut LocalStore, key: &str) -> bool {
        match store.entries.remove(key) {
            Some(entry) => {
                store.lru_queue.retain(|k| k != key);
                store.current_size_bytes = store
                    .current_size_bytes
                    .saturating_sub(entry.metadata.size_bytes);
                store.stats.entries = store.entries.len();
                store.stats.size_bytes = store.current_size_bytes;
                true
            }
            None => false,
        }
    }
}
