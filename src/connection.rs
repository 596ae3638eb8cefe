//! Redis connection management and health check implementation
//!
//! Connections are pooled and reused; nothing in this crate opens a
//! connection per call. Health checks follow a two-tier scheme: a simple
//! PING for load-balancer-style probes, and a detailed check that also
//! reports the server version and degraded-latency state.

use crate::error::{CacheError, Result};
use chrono::{DateTime, Utc};
use deadpool_redis::{Pool, Runtime};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Build a Redis connection pool from a URL.
///
/// The pool connects lazily; construction only validates the URL.
pub fn create_pool(url: &str, pool_size: usize) -> Result<Pool> {
    let mut cfg = deadpool_redis::Config::from_url(url);
    cfg.pool = Some(deadpool_redis::PoolConfig::new(pool_size));

    cfg.create_pool(Some(Runtime::Tokio1))
        .map_err(|e| CacheError::Config(format!("invalid Redis configuration: {}", e)))
}

/// Configuration for health check behavior
#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    /// Timeout for health check operations
    pub timeout: Duration,
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Delay between retry attempts
    pub retry_delay: Duration,
    /// Response time threshold for the degraded state (in milliseconds)
    pub degraded_threshold_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            degraded_threshold_ms: 1000,
        }
    }
}

/// Health status of the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Store is responsive within the degraded threshold
    Healthy,
    /// Store is responsive but slow
    Degraded,
    /// Store is not responsive or erroring
    Unhealthy,
}

impl HealthStatus {
    /// Check if the status is healthy or degraded (operational)
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Detailed health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Overall health status
    pub status: HealthStatus,
    /// Response time in milliseconds
    pub response_time_ms: u64,
    /// Redis server version (if available)
    pub server_version: Option<String>,
    /// Timestamp of the health check
    pub timestamp: DateTime<Utc>,
    /// Error message (if unhealthy)
    pub error: Option<String>,
    /// Number of retry attempts made
    pub retry_count: u32,
}

impl HealthCheckResult {
    fn healthy(
        response_time: Duration,
        server_version: Option<String>,
        degraded_threshold_ms: u64,
    ) -> Self {
        let response_time_ms = response_time.as_millis() as u64;
        let status = if response_time_ms > degraded_threshold_ms {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            status,
            response_time_ms,
            server_version,
            timestamp: Utc::now(),
            error: None,
            retry_count: 0,
        }
    }

    fn unhealthy(response_time: Duration, error: &str) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            response_time_ms: response_time.as_millis() as u64,
            server_version: None,
            timestamp: Utc::now(),
            error: Some(error.to_string()),
            retry_count: 0,
        }
    }

    fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }
}

/// Pooled Redis connection handle with health check support
pub struct RemoteConnection {
    pool: Pool,
    health_config: HealthCheckConfig,
}

impl RemoteConnection {
    /// Create a connection handle with default health check configuration
    pub fn connect(url: &str, pool_size: usize) -> Result<Self> {
        Self::with_health_config(url, pool_size, HealthCheckConfig::default())
    }

    /// Create a connection handle with custom health check configuration
    pub fn with_health_config(
        url: &str,
        pool_size: usize,
        health_config: HealthCheckConfig,
    ) -> Result<Self> {
        info!("Configuring Redis pool (size: {})", pool_size);
        let pool = create_pool(url, pool_size)?;

        Ok(Self {
            pool,
            health_config,
        })
    }

    /// Get a clone of the underlying pool (cheap handle clone)
    pub fn pool(&self) -> Pool {
        self.pool.clone()
    }

    /// Get the current health check configuration
    pub fn health_config(&self) -> &HealthCheckConfig {
        &self.health_config
    }

    /// Simple health check using PING.
    ///
    /// Fastest method with minimal overhead, suitable for frequent probes.
    pub async fn health_check(&self) -> Result<bool> {
        debug!("Executing simple health check (PING)");
        self.ping().await?;
        debug!("Simple health check passed");
        Ok(true)
    }

    /// Detailed health check using PING + INFO.
    ///
    /// Never fails - all errors are captured in the returned result.
    /// Reports the server version and flags slow responses as degraded.
    pub async fn health_check_detailed(&self) -> HealthCheckResult {
        debug!("Executing detailed health check (PING + INFO server)");
        let start = Instant::now();

        if let Err(e) = self.ping().await {
            return HealthCheckResult::unhealthy(start.elapsed(), &e.to_string());
        }

        let server_version = self.server_version().await;
        HealthCheckResult::healthy(
            start.elapsed(),
            server_version,
            self.health_config.degraded_threshold_ms,
        )
    }

    /// Execute the detailed health check with retry logic.
    ///
    /// Retries transient failures up to the configured maximum, waiting
    /// `retry_delay` between attempts.
    pub async fn health_check_with_retry(&self) -> HealthCheckResult {
        let mut retry_count = 0;

        loop {
            let result = self.health_check_detailed().await;

            if result.status.is_operational() || retry_count >= self.health_config.max_retries {
                return result.with_retry_count(retry_count);
            }

            retry_count += 1;
            warn!(
                "Health check failed (attempt {}/{}), retrying after {:?}",
                retry_count,
                self.health_config.max_retries + 1,
                self.health_config.retry_delay
            );
            tokio::time::sleep(self.health_config.retry_delay).await;
        }
    }

    /// Internal: PING the server within the health check timeout
    async fn ping(&self) -> Result<()> {
        let mut conn = self.acquire().await?;

        let pong: String =
            match tokio::time::timeout(self.health_config.timeout, async {
                redis::cmd("PING").query_async(&mut conn).await
            })
            .await
            {
                Ok(Ok(pong)) => pong,
                Ok(Err(e)) => return Err(CacheError::Connection(e.to_string())),
                Err(_) => {
                    return Err(CacheError::Timeout {
                        timeout_ms: self.health_config.timeout.as_millis() as u64,
                        context: "PING".to_string(),
                    })
                }
            };

        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Connection(format!(
                "unexpected PING response: {}",
                pong
            )))
        }
    }

    /// Internal: read the server version from INFO, best effort
    async fn server_version(&self) -> Option<String> {
        let mut conn = self.acquire().await.ok()?;

        let info: String = tokio::time::timeout(self.health_config.timeout, async {
            redis::cmd("INFO").arg("server").query_async(&mut conn).await
        })
        .await
        .ok()?
        .ok()?;

        info.lines()
            .find_map(|line| line.strip_prefix("redis_version:"))
            .map(|version| version.trim().to_string())
    }

    /// Internal: acquire a pooled connection within the health check timeout
    async fn acquire(&self) -> Result<deadpool_redis::Connection> {
        match tokio::time::timeout(self.health_config.timeout, self.pool.get()).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(CacheError::Connection(e.to_string())),
            Err(_) => Err(CacheError::Timeout {
                timeout_ms: self.health_config.timeout.as_millis() as u64,
                context: "acquire connection".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_operational() {
        assert!(HealthStatus::Healthy.is_operational());
        assert!(HealthStatus::Degraded.is_operational());
        assert!(!HealthStatus::Unhealthy.is_operational());
    }

    #[test]
    fn test_health_check_result_healthy() {
        let result =
            HealthCheckResult::healthy(Duration::from_millis(50), Some("7.2.0".to_string()), 1000);

        assert_eq!(result.status, HealthStatus::Healthy);
        assert_eq!(result.response_time_ms, 50);
        assert_eq!(result.server_version, Some("7.2.0".to_string()));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_health_check_result_degraded() {
        let result = HealthCheckResult::healthy(Duration::from_millis(1500), None, 1000);

        assert_eq!(result.status, HealthStatus::Degraded);
        assert_eq!(result.response_time_ms, 1500);
    }

    #[test]
    fn test_health_check_result_unhealthy() {
        let result = HealthCheckResult::unhealthy(Duration::from_millis(100), "connection refused");

        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(result.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_default_health_check_config() {
        let config = HealthCheckConfig::default();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert_eq!(config.degraded_threshold_ms, 1000);
    }

    #[test]
    fn test_create_pool_rejects_bad_url() {
        assert!(create_pool("not-a-url", 4).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unhealthy() {
        let conn = RemoteConnection::with_health_config(
            "redis://127.0.0.1:1",
            2,
            HealthCheckConfig {
                timeout: Duration::from_millis(200),
                max_retries: 0,
                ..Default::default()
            },
        )
        .unwrap();

        let result = conn.health_check_detailed().await;
        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert!(result.error.is_some());
    }
}
