//! Cache entry management with TTL support

use crate::cache::types::{CacheKey, CacheValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cache entry with TTL and access metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: CacheValue,

    /// Entry metadata
    pub metadata: CacheEntryMetadata,
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntryMetadata {
    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// Last access time (for LRU tracking)
    pub accessed_at: DateTime<Utc>,

    /// When the entry expires
    pub expires_at: DateTime<Utc>,

    /// Number of times this entry has been read
    pub access_count: u64,

    /// Approximate size of the entry in bytes
    pub size_bytes: usize,
}

impl CacheEntry {
    /// Create a new cache entry expiring `ttl` from now
    pub fn new(key: CacheKey, value: CacheValue, ttl: Duration) -> Self {
        let now = Utc::now();
        let expires_at =
            now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(300));
        let size_bytes = Self::approx_size(&key, &value);

        Self {
            key,
            value,
            metadata: CacheEntryMetadata {
                created_at: now,
                accessed_at: now,
                expires_at,
                access_count: 0,
                size_bytes,
            },
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.metadata.expires_at
    }

    /// Get time until expiration, or `None` if already expired
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now();
        if now > self.metadata.expires_at {
            None
        } else {
            (self.metadata.expires_at - now).to_std().ok()
        }
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.metadata.accessed_at = Utc::now();
        self.metadata.access_count += 1;
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        (Utc::now() - self.metadata.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// Approximate memory footprint: key + serialized value + metadata overhead
    fn approx_size(key: &str, value: &CacheValue) -> usize {
        key.len() + value.to_string().len() + std::mem::size_of::<CacheEntryMetadata>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    #[test]
    fn test_cache_entry_creation() {
        let entry = CacheEntry::new(
            "user:1".to_string(),
            json!({"name": "Ann"}),
            Duration::from_secs(60),
        );

        assert_eq!(entry.key, "user:1");
        assert_eq!(entry.value, json!({"name": "Ann"}));
        assert!(!entry.is_expired());
        assert_eq!(entry.metadata.access_count, 0);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(
            "test".to_string(),
            json!("value"),
            Duration::from_millis(50),
        );

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(80));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_mark_accessed() {
        let mut entry = CacheEntry::new(
            "test".to_string(),
            json!("value"),
            Duration::from_secs(60),
        );

        let initial_time = entry.metadata.accessed_at;
        sleep(Duration::from_millis(10));
        entry.mark_accessed();

        assert_eq!(entry.metadata.access_count, 1);
        assert!(entry.metadata.accessed_at > initial_time);
    }

    #[test]
    fn test_time_until_expiration() {
        let entry = CacheEntry::new(
            "test".to_string(),
            json!("value"),
            Duration::from_secs(60),
        );

        let time_left = entry.time_until_expiration();
        assert!(time_left.is_some());
        assert!(time_left.unwrap() <= Duration::from_secs(60));
    }

    #[test]
    fn test_approx_size() {
        let entry = CacheEntry::new(
            "key".to_string(),
            json!({"field": "value"}),
            Duration::from_secs(60),
        );

        assert!(entry.metadata.size_bytes > "key".len());
    }

    #[test]
    fn test_age() {
        let entry = CacheEntry::new("test".to_string(), json!(1), Duration::from_secs(60));

        sleep(Duration::from_millis(10));
        assert!(entry.age() >= Duration::from_millis(10));
    }
}
