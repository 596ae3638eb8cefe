//! Configuration for the cache system

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the tiered cache
///
/// Defaults follow the deployment the cache was sized for: a 1000-entry
/// local tier with 5-minute TTLs, a shared Redis tier with its own 5-minute
/// TTL, and a 5-minute maintenance sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries in the local (L1) tier
    pub l1_capacity: usize,

    /// Default TTL for local entries (also used when backfilling from L2)
    pub l1_default_ttl: Duration,

    /// Default TTL for remote entries
    pub l2_default_ttl: Duration,

    /// Interval between maintenance sweeps
    pub maintenance_interval: Duration,

    /// Shorter retry delay after a failed maintenance tick
    pub maintenance_backoff: Duration,

    /// TTL used by the warmup runner (longer than the defaults)
    pub warmup_ttl: Duration,

    /// Redis connection URL; `None` runs the cache in local-only mode
    pub remote_url: Option<String>,

    /// Prefix prepended to every remote key, isolating this application
    /// from others sharing the same store
    pub remote_key_prefix: String,

    /// Bounded timeout applied to every remote operation
    pub remote_op_timeout: Duration,

    /// Size of the remote connection pool
    pub remote_pool_size: usize,

    /// Jitter factor (0.0 - 1.0) applied to the backfill TTL so sibling
    /// processes don't expire backfilled entries in lockstep
    pub ttl_jitter: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            l1_capacity: 1000,
            l1_default_ttl: Duration::from_secs(300),
            l2_default_ttl: Duration::from_secs(300),
            maintenance_interval: Duration::from_secs(300),
            maintenance_backoff: Duration::from_secs(60),
            warmup_ttl: Duration::from_secs(600),
            remote_url: None,
            remote_key_prefix: "strata".to_string(),
            remote_op_timeout: Duration::from_millis(250),
            remote_pool_size: 16,
            ttl_jitter: 0.1,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Load configuration from the environment.
    ///
    /// Reads a `.env` file first if one is present, then the process
    /// environment. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            l1_capacity: env_usize("CACHE_L1_CAPACITY")?.unwrap_or(defaults.l1_capacity),
            l1_default_ttl: env_secs("CACHE_L1_TTL_SECONDS")?.unwrap_or(defaults.l1_default_ttl),
            l2_default_ttl: env_secs("CACHE_L2_TTL_SECONDS")?.unwrap_or(defaults.l2_default_ttl),
            maintenance_interval: env_secs("CACHE_MAINTENANCE_INTERVAL_SECONDS")?
                .unwrap_or(defaults.maintenance_interval),
            maintenance_backoff: env_secs("CACHE_MAINTENANCE_BACKOFF_SECONDS")?
                .unwrap_or(defaults.maintenance_backoff),
            warmup_ttl: env_secs("CACHE_WARMUP_TTL_SECONDS")?.unwrap_or(defaults.warmup_ttl),
            remote_url: std::env::var("REDIS_URL").ok(),
            remote_key_prefix: std::env::var("CACHE_KEY_PREFIX")
                .unwrap_or(defaults.remote_key_prefix),
            remote_op_timeout: env_millis("CACHE_REMOTE_TIMEOUT_MS")?
                .unwrap_or(defaults.remote_op_timeout),
            remote_pool_size: env_usize("CACHE_REMOTE_POOL_SIZE")?
                .unwrap_or(defaults.remote_pool_size),
            ttl_jitter: defaults.ttl_jitter,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.l1_capacity == 0 {
            return Err(CacheError::Config(
                "l1_capacity must be greater than 0".to_string(),
            ));
        }

        if self.l1_default_ttl.is_zero() || self.l2_default_ttl.is_zero() {
            return Err(CacheError::Config(
                "default TTLs must be greater than 0".to_string(),
            ));
        }

        if self.maintenance_interval.is_zero() || self.maintenance_backoff.is_zero() {
            return Err(CacheError::Config(
                "maintenance intervals must be greater than 0".to_string(),
            ));
        }

        if self.warmup_ttl.is_zero() {
            return Err(CacheError::Config(
                "warmup_ttl must be greater than 0".to_string(),
            ));
        }

        if self.remote_op_timeout.is_zero() {
            return Err(CacheError::Config(
                "remote_op_timeout must be greater than 0".to_string(),
            ));
        }

        if self.remote_pool_size == 0 {
            return Err(CacheError::Config(
                "remote_pool_size must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(CacheError::Config(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// The TTL used when backfilling L1 from L2, with jitter applied.
    ///
    /// Explicit TTLs passed by callers are never jittered; only the backfill
    /// path uses this.
    pub fn backfill_ttl(&self) -> Duration {
        if self.ttl_jitter == 0.0 {
            return self.l1_default_ttl;
        }

        let base_secs = self.l1_default_ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;

        Duration::from_secs_f64((base_secs + jitter).max(1.0))
    }
}

fn env_usize(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|e| CacheError::Config(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

fn env_secs(name: &str) -> Result<Option<Duration>> {
    Ok(env_usize(name)?.map(|secs| Duration::from_secs(secs as u64)))
}

fn env_millis(name: &str) -> Result<Option<Duration>> {
    Ok(env_usize(name)?.map(|ms| Duration::from_millis(ms as u64)))
}

/// Builder for cache configuration with validation
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    l1_capacity: Option<usize>,
    l1_default_ttl: Option<Duration>,
    l2_default_ttl: Option<Duration>,
    maintenance_interval: Option<Duration>,
    maintenance_backoff: Option<Duration>,
    warmup_ttl: Option<Duration>,
    remote_url: Option<String>,
    remote_key_prefix: Option<String>,
    remote_op_timeout: Option<Duration>,
    remote_pool_size: Option<usize>,
    ttl_jitter: Option<f64>,
}

impl CacheConfigBuilder {
    /// Set the local tier entry capacity
    pub fn l1_capacity(mut self, capacity: usize) -> Self {
        self.l1_capacity = Some(capacity);
        self
    }

    /// Set the default TTL for local entries
    pub fn l1_default_ttl(mut self, ttl: Duration) -> Self {
        self.l1_default_ttl = Some(ttl);
        self
    }

    /// Set the default TTL for remote entries
    pub fn l2_default_ttl(mut self, ttl: Duration) -> Self {
        self.l2_default_ttl = Some(ttl);
        self
    }

    /// Set the maintenance sweep interval
    pub fn maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance_interval = Some(interval);
        self
    }

    /// Set the retry delay after a failed maintenance tick
    pub fn maintenance_backoff(mut self, backoff: Duration) -> Self {
        self.maintenance_backoff = Some(backoff);
        self
    }

    /// Set the TTL used by the warmup runner
    pub fn warmup_ttl(mut self, ttl: Duration) -> Self {
        self.warmup_ttl = Some(ttl);
        self
    }

    /// Set the Redis connection URL
    pub fn remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Set the remote key prefix
    pub fn remote_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.remote_key_prefix = Some(prefix.into());
        self
    }

    /// Set the per-operation remote timeout
    pub fn remote_op_timeout(mut self, timeout: Duration) -> Self {
        self.remote_op_timeout = Some(timeout);
        self
    }

    /// Set the remote connection pool size
    pub fn remote_pool_size(mut self, size: usize) -> Self {
        self.remote_pool_size = Some(size);
        self
    }

    /// Set the backfill TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            l1_capacity: self.l1_capacity.unwrap_or(defaults.l1_capacity),
            l1_default_ttl: self.l1_default_ttl.unwrap_or(defaults.l1_default_ttl),
            l2_default_ttl: self.l2_default_ttl.unwrap_or(defaults.l2_default_ttl),
            maintenance_interval: self
                .maintenance_interval
                .unwrap_or(defaults.maintenance_interval),
            maintenance_backoff: self
                .maintenance_backoff
                .unwrap_or(defaults.maintenance_backoff),
            warmup_ttl: self.warmup_ttl.unwrap_or(defaults.warmup_ttl),
            remote_url: self.remote_url.or(defaults.remote_url),
            remote_key_prefix: self.remote_key_prefix.unwrap_or(defaults.remote_key_prefix),
            remote_op_timeout: self.remote_op_timeout.unwrap_or(defaults.remote_op_timeout),
            remote_pool_size: self.remote_pool_size.unwrap_or(defaults.remote_pool_size),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
        }
    }
}
