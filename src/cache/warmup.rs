//! Best-effort cache pre-population at startup
//!
//! Fetch functions run strictly sequentially so the origin data source sees
//! bounded load. Per-key failures are logged and skipped; partial warm-up is
//! an accepted outcome.

use crate::cache::coordinator::TieredCache;
use crate::cache::types::{CacheKey, CacheValue};
use crate::error::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{info, warn};

/// A registered zero-argument fetch function producing a cacheable value
type FetchFn =
    Box<dyn Fn() -> Pin<Box<dyn Future<Output = Result<CacheValue>> + Send>> + Send + Sync>;

/// Outcome of a warmup run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WarmupReport {
    /// Entries fetched and stored
    pub succeeded: usize,

    /// Entries whose fetch failed and were skipped
    pub failed: usize,
}

impl WarmupReport {
    /// Total entries attempted
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Sequential cache warmer.
///
/// Successful fetches are stored through the coordinator with the configured
/// `warmup_ttl`, longer than the default TTL so warmed entries outlive the
/// first maintenance sweeps.
pub struct WarmupRunner {
    cache: Arc<TieredCache>,
    entries: Vec<(CacheKey, FetchFn)>,
}

impl WarmupRunner {
    /// Create an empty warmup runner for the given coordinator
    pub fn new(cache: Arc<TieredCache>) -> Self {
        Self {
            cache,
            entries: Vec::new(),
        }
    }

    /// Register a fetch function for a cache key
    pub fn register<F, Fut>(mut self, key: impl Into<CacheKey>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CacheValue>> + Send + 'static,
    {
        let boxed: FetchFn = Box::new(move || {
            let fut: Pin<Box<dyn Future<Output = Result<CacheValue>> + Send>> =
                Box::pin(fetch());
            fut
        });
        self.entries.push((key.into(), boxed));
        self
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any entries are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run all registered fetches in order and store the results.
    ///
    /// A failing fetch never aborts the remaining entries.
    pub async fn run(&self) -> WarmupReport {
        let warmup_ttl = self.cache.config().warmup_ttl;
        let mut report = WarmupReport::default();

        info!(
            "Warming up {} cache entries (ttl: {:?})",
            self.entries.len(),
            warmup_ttl
        );

        for (key, fetch) in &self.entries {
            match fetch().await {
                Ok(value) => match self.cache.set(key, value, warmup_ttl).await {
                    Ok(()) => report.succeeded += 1,
                    Err(e) => {
                        warn!("Failed to store warmed entry {}: {}", key, e);
                        report.failed += 1;
                    }
                },
                Err(e) => {
                    warn!("Warmup fetch failed for {}: {}", key, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Warmup complete: {} succeeded, {} failed",
            report.succeeded, report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::CacheConfig;
    use crate::error::CacheError;
    use serde_json::json;
    use std::time::Duration;

    fn test_cache() -> Arc<TieredCache> {
        let config = CacheConfig::builder()
            .l1_capacity(100)
            .warmup_ttl(Duration::from_secs(600))
            .build();
        Arc::new(TieredCache::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_warmup_populates_cache() {
        let cache = test_cache();

        let report = WarmupRunner::new(cache.clone())
            .register("config:plans", || async { Ok(json!(["basic", "premium"])) })
            .register("config:rates", || async { Ok(json!({"point_rate": 0.01})) })
            .run()
            .await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(
            cache.get("config:plans").await,
            Some(json!(["basic", "premium"]))
        );
    }

    #[tokio::test]
    async fn test_partial_warmup_is_accepted() {
        let cache = test_cache();

        let report = WarmupRunner::new(cache.clone())
            .register("config:ok", || async { Ok(json!(1)) })
            .register("config:broken", || async {
                Err(CacheError::Other("origin unavailable".to_string()))
            })
            .register("config:also_ok", || async { Ok(json!(2)) })
            .run()
            .await;

        // The failing entry did not abort the rest
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.attempted(), 3);
        assert!(cache.get("config:ok").await.is_some());
        assert!(cache.get("config:broken").await.is_none());
        assert!(cache.get("config:also_ok").await.is_some());
    }

    #[tokio::test]
    async fn test_empty_runner() {
        let cache = test_cache();
        let runner = WarmupRunner::new(cache);

        assert!(runner.is_empty());
        let report = runner.run().await;
        assert_eq!(report.attempted(), 0);
    }
}
