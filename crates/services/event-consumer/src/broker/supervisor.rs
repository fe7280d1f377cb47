//! Restart loop for subscriptions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use common::BrokerConfig;

use super::Subscription;

/// Exponential restart delay, doubling from `initial` up to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn from_config(config: &BrokerConfig) -> Self {
        Self::new(config.restart_backoff_initial(), config.restart_backoff_max())
    }

    /// Delay before the next attempt
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

/// Keep `subscription` running until `shutdown` fires.
///
/// A subscription that stops on its own is restarted after a backoff delay.
/// A run that lasted longer than the maximum delay resets the backoff.
pub async fn supervise(subscription: Arc<dyn Subscription>, mut backoff: Backoff, shutdown: CancellationToken) {
    let topic = subscription.topic();

    loop {
        let started = Instant::now();
        let result = subscription.run(shutdown.child_token()).await;

        if shutdown.is_cancelled() {
            if let Err(e) = result {
                warn!(topic, error = %e, "Subscription failed during shutdown");
            }
            break;
        }

        if started.elapsed() >= backoff.max() {
            backoff.reset();
        }

        let delay = backoff.next_delay();
        match result {
            Ok(()) => warn!(topic, ?delay, "Subscription stopped unexpectedly, restarting"),
            Err(e) => error!(
                topic,
                code = e.code(),
                transient = e.is_transient(),
                error = %e,
                ?delay,
                "Subscription failed, restarting"
            ),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!(topic, "Subscription supervisor stopped");
}
