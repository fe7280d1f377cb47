//! Interfaces of the directory's domain services.
//!
//! Errors are returned as-is from the domain layer; callers classify them with
//! [`crate::classify`].

use async_trait::async_trait;

use domain::{AnonymousAccount, LogicResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Anonymous account lifecycle.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountLifecycle: Send + Sync {
    /// Create (or overwrite) an anonymous account
    async fn create_anonymous_account(&self, account: AnonymousAccount) -> LogicResult<()>;

    /// Revoke a single anonymous account
    async fn delete_anonymous_account(&self, id: &str) -> LogicResult<()>;

    /// Remove accounts expiring at or before `now` (Unix nanoseconds), returning how many
    async fn delete_expired_anonymous_accounts(&self, now: i64) -> LogicResult<u64>;
}

/// App lifecycle.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AppLifecycle: Send + Sync {
    async fn delete_app(&self, id: &str) -> LogicResult<()>;

    async fn rename_app(&self, id: &str, new_name: &str) -> LogicResult<()>;
}

/// Propagation of org-structure changes into the directory.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrgPropagation: Send + Sync {
    async fn on_user_deleted(&self, id: &str) -> LogicResult<()>;

    async fn on_department_deleted(&self, id: &str) -> LogicResult<()>;

    async fn on_org_manager_changed(&self, ids: &[String]) -> LogicResult<()>;

    async fn on_user_renamed(&self, id: &str, new_name: &str) -> LogicResult<()>;
}
