//! Event consumer configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use common::{AppError, AppResult, BrokerConfig, GrpcClientConfig};

/// Event consumer configuration.
#[derive(Debug, Clone)]
pub struct EventConsumerConfig {
    /// Broker connection and subscription settings
    pub broker: BrokerConfig,
    /// Directory domain service
    pub directory: GrpcClientConfig,
    /// Seconds between expired account sweeps; 0 disables the sweeper
    pub sweep_interval_secs: u64,
}

impl EventConsumerConfig {
    /// Load configuration from environment variables.
    ///
    /// Broker settings come from the JSON file named by `BROKER_CONFIG_FILE`
    /// when set, otherwise from `EVENT_CONSUMER_*` variables.
    pub fn from_env() -> AppResult<Self> {
        let broker = match env::var("BROKER_CONFIG_FILE") {
            Ok(path) if !path.is_empty() => BrokerConfig::from_file(path)?,
            _ => broker_from_env()?,
        };

        let defaults = GrpcClientConfig::default();
        let directory = GrpcClientConfig {
            endpoint: env::var("DIRECTORY_SERVICE_URL").unwrap_or(defaults.endpoint),
            connect_timeout_ms: parse_var("DIRECTORY_CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms)?,
            request_timeout_ms: parse_var("DIRECTORY_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms)?,
        };

        Ok(Self {
            broker,
            directory,
            sweep_interval_secs: parse_var("EVENT_CONSUMER_SWEEP_INTERVAL_SECS", 60)?,
        })
    }

    /// Sweep period, `None` when the sweeper is disabled
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl Default for EventConsumerConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            directory: GrpcClientConfig::default(),
            sweep_interval_secs: 60,
        }
    }
}

fn broker_from_env() -> AppResult<BrokerConfig> {
    let defaults = BrokerConfig::default();
    let config = BrokerConfig {
        url: env::var("EVENT_CONSUMER_REDIS_URL")
            .or_else(|_| env::var("REDIS_URL"))
            .unwrap_or(defaults.url),
        consumer_group: env::var("EVENT_CONSUMER_GROUP").unwrap_or(defaults.consumer_group),
        poll_interval_ms: parse_var("EVENT_CONSUMER_POLL_INTERVAL_MS", defaults.poll_interval_ms)?,
        max_in_flight: parse_var("EVENT_CONSUMER_MAX_IN_FLIGHT", defaults.max_in_flight)?,
        redelivery_idle_ms: parse_var("EVENT_CONSUMER_REDELIVERY_IDLE_MS", defaults.redelivery_idle_ms)?,
        restart_backoff_initial_ms: parse_var(
            "EVENT_CONSUMER_RESTART_BACKOFF_INITIAL_MS",
            defaults.restart_backoff_initial_ms,
        )?,
        restart_backoff_max_ms: parse_var("EVENT_CONSUMER_RESTART_BACKOFF_MAX_MS", defaults.restart_backoff_max_ms)?,
    };
    config.validate()?;
    Ok(config)
}

/// Read a numeric variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{} must be a number, got {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}
