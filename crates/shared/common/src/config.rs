//! Shared configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Upper bound on `BrokerConfig::max_in_flight`.
pub const MAX_IN_FLIGHT_LIMIT: usize = 65_536;

/// Message broker connection configuration.
///
/// Loaded once at startup, either from a JSON file or from the environment.
/// Missing fields in a file fall back to the defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Redis URL hosting the event streams
    pub url: String,
    /// Consumer group shared by every subscription
    pub consumer_group: String,
    /// Delay between polls when a stream is idle, in milliseconds
    pub poll_interval_ms: u64,
    /// Maximum delivered-but-unacknowledged messages per subscription
    pub max_in_flight: usize,
    /// Unacknowledged messages idle longer than this are redelivered, in milliseconds
    pub redelivery_idle_ms: u64,
    /// First delay before restarting a failed subscription, in milliseconds
    pub restart_backoff_initial_ms: u64,
    /// Upper bound on the restart delay, in milliseconds
    pub restart_backoff_max_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            consumer_group: "user-management".to_string(),
            poll_interval_ms: 100,
            max_in_flight: 200,
            redelivery_idle_ms: 30_000,
            restart_backoff_initial_ms: 1_000,
            restart_backoff_max_ms: 60_000,
        }
    }
}

impl BrokerConfig {
    /// Load broker configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            AppError::config(format!("Invalid broker config {}: {}", path.display(), e))
        })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded broker config");
        Ok(config)
    }

    /// Reject settings the subscriber cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.consumer_group.is_empty() {
            return Err(AppError::config("consumer_group cannot be empty"));
        }
        if self.max_in_flight == 0 {
            return Err(AppError::config("max_in_flight must be at least 1"));
        }
        if self.max_in_flight > MAX_IN_FLIGHT_LIMIT {
            return Err(AppError::config(format!(
                "max_in_flight cannot exceed {}",
                MAX_IN_FLIGHT_LIMIT
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(AppError::config("poll_interval_ms must be at least 1"));
        }
        if self.restart_backoff_initial_ms > self.restart_backoff_max_ms {
            return Err(AppError::config(
                "restart_backoff_initial_ms cannot exceed restart_backoff_max_ms",
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn redelivery_idle(&self) -> Duration {
        Duration::from_millis(self.redelivery_idle_ms)
    }

    pub fn restart_backoff_initial(&self) -> Duration {
        Duration::from_millis(self.restart_backoff_initial_ms)
    }

    pub fn restart_backoff_max(&self) -> Duration {
        Duration::from_millis(self.restart_backoff_max_ms)
    }
}

/// gRPC client connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GrpcClientConfig {
    /// Service endpoint URL (e.g., "http://localhost:50053")
    pub endpoint: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for GrpcClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50053".to_string(),
            connect_timeout_ms: 5000,
            request_timeout_ms: 30000,
        }
    }
}
