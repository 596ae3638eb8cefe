//! # Tiered Caching Layer
//!
//! This module implements the two-tier caching system that shields the
//! application's data sources from repeated read load.
//!
//! ## Features
//!
//! - **Read-Through**: local (L1) misses fall through to the shared Redis
//!   tier (L2) and backfill on a hit
//! - **Write-Through**: writes are applied to both tiers before returning
//! - **TTL-Based Expiration**: lazy expiry on read plus a background sweep
//! - **LRU Eviction**: the bounded local tier evicts least recently used
//!   entries first
//! - **Pattern Invalidation**: an entity's cached state is removed en masse
//!   across both tiers
//! - **Fail-Open**: a degraded or absent remote tier slows requests down,
//!   it never fails them
//!
//! ## Example
//!
//! ```rust
//! use strata_cache::{CacheConfig, TieredCache};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! # async fn example() -> strata_cache::Result<()> {
//! let config = CacheConfig::builder()
//!     .l1_capacity(1000)
//!     .l1_default_ttl(Duration::from_secs(300))
//!     .build();
//!
//! let cache = TieredCache::new(config)?;
//!
//! cache.set("user:1", json!({"name": "Ann"}), Duration::from_secs(60)).await?;
//!
//! if let Some(value) = cache.get("user:1").await {
//!     println!("Cache hit: {}", value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod entry;
pub mod keys;
pub mod local;
pub mod maintenance;
pub mod memo;
pub mod remote;
pub mod types;
pub mod warmup;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use coordinator::TieredCache;
pub use entry::{CacheEntry, CacheEntryMetadata};
pub use local::LocalCache;
pub use maintenance::MaintenanceScheduler;
pub use memo::Memoizer;
pub use remote::RemoteCache;
pub use types::{CacheKey, CacheStats, CacheValue, RemoteStats, RemoteStatsSnapshot, TieredStats};
pub use warmup::{WarmupReport, WarmupRunner};
