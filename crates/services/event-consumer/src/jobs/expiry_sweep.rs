//! Periodic removal of expired anonymous accounts.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use domain::LogicResult;

use crate::client::AccountLifecycle;
use crate::validation::now_nanos;

/// Delete every anonymous account that has expired by now.
pub async fn sweep_expired_accounts(accounts: &dyn AccountLifecycle) -> LogicResult<u64> {
    let deleted = accounts.delete_expired_anonymous_accounts(now_nanos()).await?;
    if deleted > 0 {
        info!(deleted, "Deleted expired anonymous accounts");
    } else {
        debug!("No expired anonymous accounts");
    }
    Ok(deleted)
}

/// Sweep every `period` until `shutdown` fires. Failures are logged and the
/// next tick tries again.
pub async fn run_expiry_sweeper(accounts: Arc<dyn AccountLifecycle>, period: Duration, shutdown: CancellationToken) {
    info!(period_secs = period.as_secs(), "Starting expired account sweeper");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = sweep_expired_accounts(accounts.as_ref()).await {
                    warn!(error = %e, "Expired account sweep failed");
                }
            }
        }
    }

    info!("Expired account sweeper stopped");
}
