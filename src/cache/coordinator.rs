//! Tiered cache coordinator: read-through/write-through across L1 and L2
//!
//! One `TieredCache` is constructed per process at startup and passed
//! explicitly (by `Arc`) to every consumer. Reads check the local tier
//! first, fall through to the remote tier and backfill on a hit; writes go
//! through both tiers before returning. The remote tier is strictly an
//! optimization: its failures degrade operations, never fail them.

use crate::cache::config::CacheConfig;
use crate::cache::local::LocalCache;
use crate::cache::remote::RemoteCache;
use crate::cache::types::{CacheValue, TieredStats};
use crate::error::{CacheError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Coordinator for the local (L1) and remote (L2) cache tiers.
///
/// Without a configured `remote_url` the coordinator runs local-only and
/// every operation behaves exactly as if the remote tier had failed.
pub struct TieredCache {
    config: CacheConfig,
    local: LocalCache,
    remote: Option<RemoteCache>,
}

impl TieredCache {
    /// Create a coordinator from configuration.
    ///
    /// Validates the configuration and builds the remote tier when a URL is
    /// configured. The remote pool connects lazily, so this never blocks on
    /// the network.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let local = LocalCache::new(config.l1_capacity);
        let remote = match config.remote_url {
            Some(_) => Some(RemoteCache::new(&config)?),
            None => None,
        };

        info!(
            "Initialized tiered cache (l1_capacity: {}, remote: {})",
            config.l1_capacity,
            if remote.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            config,
            local,
            remote,
        })
    }

    /// Get a value, checking L1 first and falling through to L2.
    ///
    /// An L2 hit backfills L1 with the default local TTL (jittered), so the
    /// next read for the same key is served in-process.
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        if let Some(value) = self.local.get(key).await {
            return Some(value);
        }

        let remote = self.remote.as_ref()?;
        let value = remote.get(key).await?;

        let backfill_ttl = self.config.backfill_ttl();
        if let Err(e) = self.local.set(key, value.clone(), backfill_ttl).await {
            warn!("Failed to backfill local tier for {}: {}", key, e);
        } else {
            debug!("Backfilled local tier: {} (ttl: {:?})", key, backfill_ttl);
        }

        Some(value)
    }

    /// Write a value through both tiers.
    ///
    /// The local write completes synchronously before this returns
    /// (read-your-write); a remote failure is logged and accepted, trading
    /// cross-process freshness for local availability. A null payload is a
    /// deletion: the absent sentinel is never stored.
    pub async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl { ttl });
        }

        if value.is_null() {
            debug!("Null payload for {} treated as deletion", key);
            self.delete(key).await;
            return Ok(());
        }

        self.local.set(key, value.clone(), ttl).await?;

        if let Some(remote) = &self.remote {
            if !remote.set(key, &value, ttl).await {
                warn!(
                    "Write-through to remote tier failed for {}; serving locally only",
                    key
                );
            }
        }

        Ok(())
    }

    /// Delete a key from both tiers independently.
    ///
    /// Returns whether the key was present in either tier; one tier's
    /// failure never blocks the other.
    pub async fn delete(&self, key: &str) -> bool {
        let local_removed = self.local.delete(key).await;
        let remote_removed = match &self.remote {
            Some(remote) => remote.delete(key).await,
            None => false,
        };

        local_removed || remote_removed
    }

    /// Remove every key matching `pattern` from both tiers.
    ///
    /// L1 uses substring matching; L2 scans with a substring glob and bulk
    /// deletes the matches. Returns the total number of removals across
    /// tiers.
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut removed = self.local.invalidate_substring(pattern).await;

        if let Some(remote) = &self.remote {
            let keys = remote.scan(pattern).await;
            if !keys.is_empty() {
                removed += remote.delete_many(&keys).await;
            }
        }

        info!(
            "Invalidated {} entries matching '{}' across tiers",
            removed, pattern
        );
        removed
    }

    /// Get a cached value or compute and store it.
    ///
    /// On a miss the caller's closure runs; its error propagates unchanged
    /// and nothing is cached for that attempt. A null result is returned but
    /// never cached. Concurrent callers on a cold key may each compute and
    /// write (last-write-wins) - duplicated upstream work, never corruption.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<CacheValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CacheValue>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        debug!("Computing value for cold key: {}", key);
        let value = compute().await?;

        if value.is_null() {
            return Ok(value);
        }

        self.set(key, value.clone(), ttl).await?;
        Ok(value)
    }

    /// Merged statistics for both tiers
    pub async fn stats(&self) -> TieredStats {
        TieredStats {
            l1: self.local.stats().await,
            l2: self.remote.as_ref().map(|remote| remote.stats()),
        }
    }

    /// Check tier health. The local tier is always operational; the remote
    /// tier is probed with a PING when configured.
    pub async fn health_check(&self) -> bool {
        match &self.remote {
            Some(remote) => {
                let healthy = remote.connection().health_check().await.unwrap_or(false);
                if !healthy {
                    warn!("Remote tier health check failed; serving local-only");
                }
                // The cache stays operational on L1 alone
                true
            }
            None => true,
        }
    }

    /// The local (L1) tier, for maintenance sweeps and tests
    pub fn local(&self) -> &LocalCache {
        &self.local
    }

    /// The remote (L2) tier, if configured
    pub fn remote(&self) -> Option<&RemoteCache> {
        self.remote.as_ref()
    }

    /// The configuration this coordinator was built from
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
