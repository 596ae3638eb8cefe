//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache key type - string-based, built via the `keys` module
pub type CacheKey = String;

/// Cache value type - an opaque, serializable JSON payload.
///
/// `Value::Null` is the absent sentinel and is never stored; writing a null
/// payload is treated as a deletion.
pub type CacheValue = serde_json::Value;

/// Statistics for the local (L1) tier
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Total number of cache hits
    pub hits: u64,

    /// Total number of cache misses
    pub misses: u64,

    /// Total number of writes
    pub sets: u64,

    /// Total number of explicit deletes
    pub deletes: u64,

    /// Number of entries currently in the cache
    pub entries: usize,

    /// Configured entry capacity
    pub capacity: usize,

    /// Approximate size of cached data in bytes
    pub size_bytes: usize,

    /// Number of evictions due to the capacity limit
    pub evictions_size: u64,

    /// Number of evictions due to TTL expiration
    pub evictions_ttl: u64,

    /// Number of entries removed by pattern invalidation
    pub invalidations: u64,
}

impl CacheStats {
    /// Cache hit rate as a percentage: hits / (hits + misses)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }

    /// Total evictions across both causes
    pub fn total_evictions(&self) -> u64 {
        self.evictions_size + self.evictions_ttl
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, entries: {}/{}, size: {} bytes, evictions: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.entries,
            self.capacity,
            self.size_bytes,
            self.total_evictions()
        )
    }
}

/// Lock-free counters for the remote (L2) tier.
///
/// Remote operations run outside any lock, so these are atomics rather than
/// state guarded alongside the data.
#[derive(Debug, Default)]
pub struct RemoteStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    failures: AtomicU64,
}

impl RemoteStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of the counters
    pub fn snapshot(&self) -> RemoteStatsSnapshot {
        RemoteStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable snapshot of [`RemoteStats`]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,

    /// Transport/serialization failures absorbed by the fail-open boundary
    pub failures: u64,
}

impl RemoteStatsSnapshot {
    /// Remote hit rate as a percentage: hits / (hits + misses)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for RemoteStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RemoteStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, sets: {}, deletes: {}, failures: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.sets,
            self.deletes,
            self.failures
        )
    }
}

/// Merged statistics across both tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieredStats {
    /// Local (L1) tier statistics
    pub l1: CacheStats,

    /// Remote (L2) tier statistics, absent in local-only mode
    pub l2: Option<RemoteStatsSnapshot>,
}

impl TieredStats {
    /// Overall hit rate across both tiers as a percentage.
    ///
    /// The remote tier is only consulted on a local miss, so a remote miss is
    /// by construction an overall miss.
    pub fn overall_hit_rate(&self) -> f64 {
        let (hits, misses) = match &self.l2 {
            Some(l2) => (self.l1.hits + l2.hits, l2.misses),
            None => (self.l1.hits, self.l1.misses),
        };

        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for TieredStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.l2 {
            Some(l2) => write!(
                f,
                "TieredStats {{ overall_hit_rate: {:.2}%, l1: {}, l2: {} }}",
                self.overall_hit_rate(),
                self.l1,
                l2
            ),
            None => write!(
                f,
                "TieredStats {{ overall_hit_rate: {:.2}%, l1: {} }}",
                self.overall_hit_rate(),
                self.l1
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };

        assert_eq!(stats.hit_rate(), 80.0);
        assert_eq!(stats.miss_rate(), 20.0);
    }

    #[test]
    fn test_cache_stats_zero_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.miss_rate(), 100.0);
    }

    #[test]
    fn test_remote_stats_counters() {
        let stats = RemoteStats::default();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_set();
        stats.record_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.sets, 1);
        assert_eq!(snapshot.failures, 1);
        assert!((snapshot.hit_rate() - 66.66).abs() < 1.0);
    }

    #[test]
    fn test_overall_hit_rate_with_remote() {
        let stats = TieredStats {
            l1: CacheStats {
                hits: 6,
                misses: 4,
                ..Default::default()
            },
            l2: Some(RemoteStatsSnapshot {
                hits: 3,
                misses: 1,
                ..Default::default()
            }),
        };

        // 6 L1 hits + 3 L2 hits over 10 lookups; the single L2 miss is the
        // only lookup that missed both tiers.
        assert_eq!(stats.overall_hit_rate(), 90.0);
    }

    #[test]
    fn test_overall_hit_rate_local_only() {
        let stats = TieredStats {
            l1: CacheStats {
                hits: 1,
                misses: 3,
                ..Default::default()
            },
            l2: None,
        };

        assert_eq!(stats.overall_hit_rate(), 25.0);
    }

    #[test]
    fn test_stats_display() {
        let stats = CacheStats {
            hits: 100,
            misses: 50,
            entries: 75,
            capacity: 1000,
            size_bytes: 1024,
            ..Default::default()
        };

        let display = format!("{}", stats);
        assert!(display.contains("hits: 100"));
        assert!(display.contains("75/1000"));
    }
}
