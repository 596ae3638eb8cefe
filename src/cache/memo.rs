//! Memoization facade over the tiered cache
//!
//! Wraps typed async compute functions with get-or-compute semantics. The
//! cache key is built from an explicit, caller-supplied function name plus a
//! deterministic JSON serialization of the argument bundle - serde_json's
//! default map keeps object keys sorted, so field order in the caller's
//! struct or map never changes the key. No runtime reflection is involved.

use crate::cache::coordinator::TieredCache;
use crate::cache::keys;
use crate::error::{CacheError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Typed memoization wrapper around a [`TieredCache`].
///
/// A result that serializes to the absent sentinel (`null` - e.g. a `None`
/// return) is never cached; such calls are always recomputed.
pub struct Memoizer {
    cache: Arc<TieredCache>,
    ttl: Duration,
}

impl Memoizer {
    /// Create a memoizer storing results with the given TTL
    pub fn new(cache: Arc<TieredCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Call a compute function through the cache.
    ///
    /// `func` names the computation and must be unique per function;
    /// `args` is any serializable bundle of its arguments. On a hit the
    /// cached payload is decoded into `T`; an undecodable payload (e.g.
    /// after a type change) is treated as a miss and recomputed. Compute
    /// errors propagate unchanged and nothing is cached for that attempt.
    pub async fn call<A, T, F, Fut>(&self, func: &str, args: &A, compute: F) -> Result<T>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = self.key_for(func, args)?;

        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_value::<T>(cached) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(
                        "Cached payload for {} no longer decodes ({}); recomputing",
                        key, e
                    );
                }
            }
        }

        let result = compute().await?;

        let value = serde_json::to_value(&result)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        if !value.is_null() {
            self.cache.set(&key, value, self.ttl).await?;
        }

        Ok(result)
    }

    /// Drop the memoized result for one `(func, args)` combination
    pub async fn invalidate<A>(&self, func: &str, args: &A) -> Result<bool>
    where
        A: Serialize + ?Sized,
    {
        let key = self.key_for(func, args)?;
        Ok(self.cache.delete(&key).await)
    }

    fn key_for<A>(&self, func: &str, args: &A) -> Result<String>
    where
        A: Serialize + ?Sized,
    {
        let args_json = serde_json::to_string(args)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(keys::memo_key(func, &args_json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::CacheConfig;
    use serde::Deserialize;
    use serde_json::json;

    fn memoizer() -> (Arc<TieredCache>, Memoizer) {
        let config = CacheConfig::builder().l1_capacity(100).build();
        let cache = Arc::new(TieredCache::new(config).unwrap());
        let memo = Memoizer::new(cache.clone(), Duration::from_secs(60));
        (cache, memo)
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Report {
        total: u64,
        label: String,
    }

    #[tokio::test]
    async fn test_memoized_result_is_reused() {
        let (_cache, memo) = memoizer();
        let mut calls = 0;

        for _ in 0..3 {
            let report: Report = memo
                .call("monthly_report", &json!({"month": 1}), || {
                    calls += 1;
                    async {
                        Ok(Report {
                            total: 1250,
                            label: "january".to_string(),
                        })
                    }
                })
                .await
                .unwrap();
            assert_eq!(report.total, 1250);
        }

        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_distinct_args_are_distinct_entries() {
        let (_cache, memo) = memoizer();

        let a: u64 = memo
            .call("square", &json!({"n": 2}), || async { Ok(4u64) })
            .await
            .unwrap();
        let b: u64 = memo
            .call("square", &json!({"n": 3}), || async { Ok(9u64) })
            .await
            .unwrap();

        assert_eq!(a, 4);
        assert_eq!(b, 9);
    }

    #[tokio::test]
    async fn test_arg_field_order_does_not_matter() {
        let (_cache, memo) = memoizer();
        let mut calls = 0;

        let _: u64 = memo
            .call("lookup", &json!({"a": 1, "b": 2}), || {
                calls += 1;
                async { Ok(7u64) }
            })
            .await
            .unwrap();

        // Same arguments written in the opposite order hit the same entry
        let reused: u64 = memo
            .call("lookup", &json!({"b": 2, "a": 1}), || {
                calls += 1;
                async { Ok(0u64) }
            })
            .await
            .unwrap();

        assert_eq!(reused, 7);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_none_results_are_never_cached() {
        let (_cache, memo) = memoizer();
        let mut calls = 0;

        for _ in 0..2 {
            let result: Option<String> = memo
                .call("find_user", &json!({"id": 404}), || {
                    calls += 1;
                    async { Ok(None) }
                })
                .await
                .unwrap();
            assert!(result.is_none());
        }

        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_compute_error_propagates_uncached() {
        let (cache, memo) = memoizer();

        let result: Result<u64> = memo
            .call("flaky", &json!({"id": 1}), || async {
                Err(CacheError::Other("upstream down".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert!(cache.local().is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (_cache, memo) = memoizer();
        let mut calls = 0;

        let _: u64 = memo
            .call("rate", &json!({"tier": "gold"}), || {
                calls += 1;
                async { Ok(3u64) }
            })
            .await
            .unwrap();

        assert!(memo.invalidate("rate", &json!({"tier": "gold"})).await.unwrap());

        let _: u64 = memo
            .call("rate", &json!({"tier": "gold"}), || {
                calls += 1;
                async { Ok(5u64) }
            })
            .await
            .unwrap();

        assert_eq!(calls, 2);
    }
}
