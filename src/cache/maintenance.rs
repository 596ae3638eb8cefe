//! Background maintenance: periodic sweep of expired local entries and
//! stats emission
//!
//! Exactly one scheduler runs per process. Iterations never overlap: the
//! next tick is scheduled only after the current one fully completes. A
//! failed tick logs a warning and retries after a shorter backoff instead of
//! terminating the loop.

use crate::cache::coordinator::TieredCache;
use crate::error::{CacheError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Periodic maintenance loop for a [`TieredCache`].
///
/// Lifecycle: `Stopped -> start() -> Running -> stop() -> Stopped`.
/// Starting while running is a caller error.
pub struct MaintenanceScheduler {
    cache: Arc<TieredCache>,
    interval: Duration,
    backoff: Duration,
    handle: Option<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
}

impl MaintenanceScheduler {
    /// Create a scheduler using the cache's configured interval and backoff
    pub fn new(cache: Arc<TieredCache>) -> Self {
        let interval = cache.config().maintenance_interval;
        let backoff = cache.config().maintenance_backoff;

        Self {
            cache,
            interval,
            backoff,
            handle: None,
            shutdown: None,
        }
    }

    /// Whether the background task is currently running
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Start the background task.
    ///
    /// Returns [`CacheError::Scheduler`] if already running.
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Err(CacheError::Scheduler(
                "maintenance scheduler is already running".to_string(),
            ));
        }

        info!(
            "Starting maintenance scheduler (interval: {:?}, backoff: {:?})",
            self.interval, self.backoff
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let cache = self.cache.clone();
        let handle = tokio::spawn(run_loop(cache, self.interval, self.backoff, shutdown_rx));

        self.handle = Some(handle);
        self.shutdown = Some(shutdown_tx);
        Ok(())
    }

    /// Stop the background task and wait for it to finish.
    ///
    /// A no-op when already stopped.
    pub async fn stop(&mut self) -> Result<()> {
        let (Some(handle), Some(shutdown)) = (self.handle.take(), self.shutdown.take()) else {
            debug!("Maintenance scheduler already stopped");
            return Ok(());
        };

        shutdown.send(true).ok();
        handle
            .await
            .map_err(|e| CacheError::Scheduler(format!("failed to join maintenance task: {}", e)))
    }
}

async fn run_loop(
    cache: Arc<TieredCache>,
    interval: Duration,
    backoff: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Maintenance scheduler running");
    let mut wait = interval;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            // Fires on an explicit stop or when the scheduler is dropped
            _ = shutdown.changed() => break,
        }

        match tick(&cache).await {
            Ok(purged) => {
                if purged > 0 {
                    debug!("Maintenance sweep reclaimed {} expired entries", purged);
                }
                wait = interval;
            }
            Err(e) => {
                warn!(
                    "Maintenance tick failed: {}; retrying in {:?}",
                    e, backoff
                );
                wait = backoff;
            }
        }
    }

    info!("Maintenance scheduler stopped");
}

/// One maintenance iteration: sweep expired local entries, probe the remote
/// tier when configured, and emit aggregated stats to the logging sink.
async fn tick(cache: &TieredCache) -> Result<usize> {
    let purged = cache.local().purge_expired().await;

    if let Some(remote) = cache.remote() {
        remote.connection().health_check().await?;
    }

    let stats = cache.stats().await;
    info!("Maintenance sweep: purged {} expired; {}", purged, stats);

    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::CacheConfig;
    use serde_json::json;

    fn test_cache(interval: Duration) -> Arc<TieredCache> {
        let config = CacheConfig::builder()
            .l1_capacity(100)
            .maintenance_interval(interval)
            .maintenance_backoff(interval)
            .build();
        Arc::new(TieredCache::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_sweep_reclaims_expired_entries() {
        let cache = test_cache(Duration::from_millis(40));
        let mut scheduler = MaintenanceScheduler::new(cache.clone());

        cache
            .set("short", json!(1), Duration::from_millis(20))
            .await
            .unwrap();
        cache
            .set("long", json!(2), Duration::from_secs(60))
            .await
            .unwrap();

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        scheduler.stop().await.unwrap();

        // The expired entry was reclaimed without ever being re-read
        assert_eq!(cache.local().len().await, 1);
        assert!(cache.local().contains_key("long").await);
    }

    #[tokio::test]
    async fn test_double_start_is_an_error() {
        let cache = test_cache(Duration::from_secs(300));
        let mut scheduler = MaintenanceScheduler::new(cache);

        scheduler.start().unwrap();
        assert!(matches!(
            scheduler.start(),
            Err(CacheError::Scheduler(_))
        ));

        scheduler.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let cache = test_cache(Duration::from_secs(300));
        let mut scheduler = MaintenanceScheduler::new(cache);

        assert!(!scheduler.is_running());
        scheduler.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let cache = test_cache(Duration::from_secs(300));
        let mut scheduler = MaintenanceScheduler::new(cache);

        scheduler.start().unwrap();
        assert!(scheduler.is_running());

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());

        scheduler.start().unwrap();
        assert!(scheduler.is_running());
        scheduler.stop().await.unwrap();
    }
}
