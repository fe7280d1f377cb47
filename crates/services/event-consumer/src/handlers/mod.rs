//! Event handlers, one per topic.
//!
//! Every handler follows the same template:
//! 1. decode and validate the payload against its [`Schema`](crate::validation::Schema);
//! 2. map it to a typed request, applying the semantic checks;
//! 3. invoke exactly one domain operation and classify its error.
//!
//! Invalid payloads are logged and acknowledged (`Ok`). A domain error is
//! returned, asking the broker to redeliver, only when it is retryable.

mod account;
mod app;
mod org;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use tracing::{error, warn};

use domain::LogicResult;

use crate::classify::should_retry;
use crate::validation::ValidationError;

pub use account::{CreateAnonymousAccountHandler, DeleteAnonymousAccountsHandler};
pub use app::{DeleteAppHandler, RenameAppHandler};
pub use org::{DepartmentDeletedHandler, OrgManagerChangedHandler, OrgNameChangedHandler, UserDeletedHandler};

/// Callback bound to a topic.
///
/// `Ok` acknowledges the message; `Err` leaves it for redelivery.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn handle(&self, payload: &[u8]) -> LogicResult<()>;
}

/// Log a rejected payload and acknowledge it.
fn drop_invalid(handler: &'static str, err: ValidationError) -> LogicResult<()> {
    warn!(handler, error = %err, "Dropping invalid event");
    Ok(())
}

/// Turn a domain-call result into the handler outcome.
fn settle(handler: &'static str, id: &str, result: LogicResult<()>) -> LogicResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if should_retry(Some(&e)) => {
            warn!(handler, id, error = %e, "Domain call failed, requesting redelivery");
            Err(e)
        }
        Err(e) => {
            error!(handler, id, error = %e, "Domain call rejected event, dropping it");
            Ok(())
        }
    }
}
