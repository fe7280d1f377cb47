//! Broker subscription plumbing.
//!
//! Each topic is a Redis stream consumed through a shared consumer group.
//! Delivery is at-least-once: a message is acknowledged only after its handler
//! returns `Ok`, otherwise it stays pending and is reclaimed later.

mod stream;
mod subscriber;
mod supervisor;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use common::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg(any(test, feature = "test-utils"))]
pub use stream::MockStreamOps;
pub use stream::{Delivery, RedisStream, StreamOps};
pub use subscriber::StreamSubscriber;
pub use supervisor::{supervise, Backoff};

/// A long-running subscription to one topic.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Subscription: Send + Sync {
    fn topic(&self) -> &'static str;

    /// Consume until `shutdown` fires (`Ok`) or the connection fails (`Err`).
    async fn run(&self, shutdown: CancellationToken) -> AppResult<()>;
}
