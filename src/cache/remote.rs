//! Remote (L2) tier: shared, Redis-backed cache with fail-open semantics
//!
//! Every operation here is strictly an optimization: transport failures,
//! timeouts and undecodable payloads degrade to a miss (`get`) or a logged
//! no-op (`set`/`delete`) instead of surfacing to callers. The typed error
//! boundary lives in the `try_*` methods; the public methods absorb those
//! errors and record them as failures.

use crate::cache::config::CacheConfig;
use crate::cache::types::{CacheValue, RemoteStats, RemoteStatsSnapshot};
use crate::connection::RemoteConnection;
use crate::error::{CacheError, Result};
use redis::AsyncCommands;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Redis-backed cache tier.
///
/// Logically unbounded from this crate's point of view; capacity and
/// eviction are owned by the Redis server. All keys carry the configured
/// prefix so unrelated applications can share the same store.
pub struct RemoteCache {
    connection: RemoteConnection,
    prefix: String,
    op_timeout: Duration,
    stats: Arc<RemoteStats>,
}

impl RemoteCache {
    /// Create a remote cache tier from configuration.
    ///
    /// Requires `remote_url` to be set; the pool connects lazily, so an
    /// unreachable server surfaces only as degraded operations later.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let url = config
            .remote_url
            .as_deref()
            .ok_or_else(|| CacheError::Config("remote_url is not configured".to_string()))?;

        let connection = RemoteConnection::connect(url, config.remote_pool_size)?;

        Ok(Self {
            connection,
            prefix: config.remote_key_prefix.clone(),
            op_timeout: config.remote_op_timeout,
            stats: Arc::new(RemoteStats::default()),
        })
    }

    /// Get a value. Transport failures and undecodable payloads are misses.
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        match self.try_get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!("Remote cache hit: {}", key);
                    self.stats.record_hit();
                    Some(value)
                }
                Err(e) => {
                    warn!("Undeserializable remote payload for {}: {}", key, e);
                    self.stats.record_miss();
                    None
                }
            },
            Ok(None) => {
                debug!("Remote cache miss: {}", key);
                self.stats.record_miss();
                None
            }
            Err(e) => {
                warn!("Remote GET degraded to miss for {}: {}", key, e);
                self.stats.record_failure();
                self.stats.record_miss();
                None
            }
        }
    }

    /// Set a value with TTL. Returns false on any failure, never raises.
    pub async fn set(&self, key: &str, value: &CacheValue, ttl: Duration) -> bool {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize payload for {}: {}", key, e);
                self.stats.record_failure();
                return false;
            }
        };

        match self.try_set(key, payload, ttl).await {
            Ok(()) => {
                debug!("Remote cache set: {} (ttl: {:?})", key, ttl);
                self.stats.record_set();
                true
            }
            Err(e) => {
                warn!("Remote SET failed for {}: {}", key, e);
                self.stats.record_failure();
                false
            }
        }
    }

    /// Delete a key. Returns whether the key existed; false on failure.
    pub async fn delete(&self, key: &str) -> bool {
        match self.try_delete(key).await {
            Ok(removed) => {
                if removed {
                    debug!("Remote cache delete: {}", key);
                    self.stats.record_delete();
                }
                removed
            }
            Err(e) => {
                warn!("Remote DEL failed for {}: {}", key, e);
                self.stats.record_failure();
                false
            }
        }
    }

    /// Check if a key exists. False on failure.
    pub async fn exists(&self, key: &str) -> bool {
        match self.try_exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Remote EXISTS failed for {}: {}", key, e);
                self.stats.record_failure();
                false
            }
        }
    }

    /// Refresh a key's TTL in place. False if the key is missing or on failure.
    pub async fn expire(&self, key: &str, ttl: Duration) -> bool {
        match self.try_expire(key, ttl).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                warn!("Remote EXPIRE failed for {}: {}", key, e);
                self.stats.record_failure();
                false
            }
        }
    }

    /// Find all keys containing `pattern`, returned without the key prefix.
    /// Empty on failure.
    pub async fn scan(&self, pattern: &str) -> Vec<String> {
        match self.try_scan(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Remote SCAN failed for '{}': {}", pattern, e);
                self.stats.record_failure();
                Vec::new()
            }
        }
    }

    /// Delete many keys at once. Returns the number removed; 0 on failure.
    pub async fn delete_many(&self, keys: &[String]) -> usize {
        if keys.is_empty() {
            return 0;
        }

        match self.try_delete_many(keys).await {
            Ok(removed) => {
                debug!("Remote cache removed {} keys", removed);
                for _ in 0..removed {
                    self.stats.record_delete();
                }
                removed
            }
            Err(e) => {
                warn!("Remote bulk delete failed: {}", e);
                self.stats.record_failure();
                0
            }
        }
    }

    /// Take a snapshot of the tier's counters
    pub fn stats(&self) -> RemoteStatsSnapshot {
        self.stats.snapshot()
    }

    /// The underlying connection handle, for health checks
    pub fn connection(&self) -> &RemoteConnection {
        &self.connection
    }

    // --- typed error boundary ---

    async fn try_get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        let full_key = self.prefixed(key);
        self.with_timeout("GET", conn.get::<_, Option<String>>(full_key))
            .await
    }

    async fn try_set(&self, key: &str, payload: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        let full_key = self.prefixed(key);
        let ttl_secs = ttl.as_secs().max(1);
        self.with_timeout("SETEX", conn.set_ex::<_, _, ()>(full_key, payload, ttl_secs))
            .await
    }

    async fn try_delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let full_key = self.prefixed(key);
        let removed: u64 = self.with_timeout("DEL", conn.del(full_key)).await?;
        Ok(removed > 0)
    }

    async fn try_exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let full_key = self.prefixed(key);
        self.with_timeout("EXISTS", conn.exists::<_, bool>(full_key))
            .await
    }

    async fn try_expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn().await?;
        let full_key = self.prefixed(key);
        let ttl_secs = ttl.as_secs().max(1) as i64;
        self.with_timeout("EXPIRE", conn.expire::<_, bool>(full_key, ttl_secs))
            .await
    }

    async fn try_scan(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        let prefix = self.key_prefix();
        let glob = format!("{}*{}*", prefix, pattern);

        // SCAN may yield the same key more than once; collect into a set
        let op = async move {
            let mut keys = BTreeSet::new();
            let mut iter: redis::AsyncIter<'_, String> = conn.scan_match(&glob).await?;
            while let Some(key) = iter.next_item().await {
                keys.insert(key);
            }
            Ok(keys)
        };

        let found: BTreeSet<String> = self.with_timeout("SCAN", op).await?;
        Ok(found
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(String::from))
            .collect())
    }

    async fn try_delete_many(&self, keys: &[String]) -> Result<usize> {
        let mut conn = self.conn().await?;
        let full_keys: Vec<String> = keys.iter().map(|key| self.prefixed(key)).collect();
        let removed: u64 = self.with_timeout("DEL", conn.del(full_keys)).await?;
        Ok(removed as usize)
    }

    /// Acquire a pooled connection within the operation timeout
    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        match tokio::time::timeout(self.op_timeout, self.connection.pool().get()).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(CacheError::Connection(e.to_string())),
            Err(_) => Err(self.timeout_error("acquire connection")),
        }
    }

    /// Run a Redis future inside the bounded operation timeout
    async fn with_timeout<T>(
        &self,
        context: &str,
        fut: impl Future<Output = redis::RedisResult<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Connection(e.to_string())),
            Err(_) => Err(self.timeout_error(context)),
        }
    }

    fn timeout_error(&self, context: &str) -> CacheError {
        CacheError::Timeout {
            timeout_ms: self.op_timeout.as_millis() as u64,
            context: context.to_string(),
        }
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix(), key)
    }

    fn key_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}:", self.prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unreachable_cache() -> RemoteCache {
        let config = CacheConfig::builder()
            .remote_url("redis://127.0.0.1:1")
            .remote_op_timeout(Duration::from_millis(100))
            .remote_pool_size(2)
            .build();
        RemoteCache::new(&config).unwrap()
    }

    #[test]
    fn test_new_requires_remote_url() {
        let config = CacheConfig::default();
        assert!(matches!(
            RemoteCache::new(&config),
            Err(CacheError::Config(_))
        ));
    }

    #[test]
    fn test_key_prefixing() {
        let cache = unreachable_cache();
        assert_eq!(cache.prefixed("user:1"), "strata:user:1");
    }

    #[tokio::test]
    async fn test_get_fails_open() {
        let cache = unreachable_cache();

        assert_eq!(cache.get("user:1").await, None);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.failures, 1);
    }

    #[tokio::test]
    async fn test_mutations_fail_open() {
        let cache = unreachable_cache();

        assert!(!cache.set("user:1", &json!({"name": "Ann"}), Duration::from_secs(60)).await);
        assert!(!cache.delete("user:1").await);
        assert!(!cache.exists("user:1").await);
        assert!(!cache.expire("user:1", Duration::from_secs(60)).await);
        assert!(cache.scan("user:").await.is_empty());
        assert_eq!(
            cache.delete_many(&["user:1".to_string(), "user:2".to_string()]).await,
            0
        );

        let stats = cache.stats();
        assert!(stats.failures >= 6);
        assert_eq!(stats.sets, 0);
        assert_eq!(stats.deletes, 0);
    }

    #[tokio::test]
    async fn test_delete_many_empty_is_noop() {
        let cache = unreachable_cache();
        assert_eq!(cache.delete_many(&[]).await, 0);
        assert_eq!(cache.stats().failures, 0);
    }
}
