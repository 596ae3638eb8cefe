//! # strata-cache
//!
//! A two-tier caching library: a bounded in-process tier (L1) layered in
//! front of a shared Redis tier (L2), coordinated by read-through and
//! write-through logic.
//!
//! ## Features
//!
//! - Async-first design using tokio
//! - Bounded L1 with LRU eviction and TTL expiry
//! - Shared, pooled Redis L2 with bounded per-operation timeouts
//! - Fail-open degradation: caching is strictly an optimization, never a
//!   hard dependency
//! - Pattern-based invalidation across both tiers
//! - Background maintenance sweep with error backoff
//! - Startup warmup and typed memoization facades
//!
//! ## Getting started
//!
//! One `TieredCache` is constructed per process and passed explicitly to
//! every consumer:
//!
//! ```no_run
//! use strata_cache::{CacheConfig, TieredCache};
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CacheConfig::builder()
//!         .remote_url("redis://localhost:6379")
//!         .remote_key_prefix("myapp")
//!         .build();
//!
//!     let cache = Arc::new(TieredCache::new(config)?);
//!
//!     cache.set("user:1", json!({"name": "Ann"}), Duration::from_secs(300)).await?;
//!     let user = cache.get("user:1").await;
//!     println!("{:?}", user);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Computing through the cache
//!
//! ```no_run
//! use strata_cache::{CacheConfig, TieredCache};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = TieredCache::new(CacheConfig::default())?;
//!
//!     let plans = cache
//!         .get_or_compute("config:plans", Duration::from_secs(300), || async {
//!             // stands in for the real origin query
//!             Ok(json!(["basic", "premium"]))
//!         })
//!         .await?;
//!     println!("{}", plans);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Background maintenance
//!
//! ```no_run
//! use strata_cache::{CacheConfig, MaintenanceScheduler, TieredCache};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = Arc::new(TieredCache::new(CacheConfig::from_env()?)?);
//!
//!     let mut scheduler = MaintenanceScheduler::new(cache.clone());
//!     scheduler.start()?;
//!
//!     // ... serve requests ...
//!
//!     scheduler.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod connection;
pub mod error;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheConfigBuilder, CacheEntry, CacheEntryMetadata, CacheKey, CacheStats,
    CacheValue, LocalCache, MaintenanceScheduler, Memoizer, RemoteCache, RemoteStats,
    RemoteStatsSnapshot, TieredCache, TieredStats, WarmupReport, WarmupRunner,
};
pub use cache::keys;
pub use connection::{
    HealthCheckConfig, HealthCheckResult, HealthStatus, RemoteConnection,
};
pub use error::{CacheError, Result};
