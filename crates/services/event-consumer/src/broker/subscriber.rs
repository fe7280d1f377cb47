//! Stream subscriber for a single topic.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use common::{AppError, AppResult, BrokerConfig};

use super::stream::{Delivery, RedisStream, StreamOps};
use super::Subscription;
use crate::handlers::EventHandler;

/// Consumes one topic through the shared consumer group and hands each
/// message to its handler.
///
/// Up to `max_in_flight` messages are processed concurrently. Messages left
/// unacknowledged for longer than the redelivery idle time are reclaimed and
/// handled again.
pub struct StreamSubscriber {
    stream: Arc<dyn StreamOps>,
    topic: &'static str,
    handler: Arc<dyn EventHandler>,
    poll_interval: Duration,
    max_in_flight: usize,
}

impl StreamSubscriber {
    pub fn new(
        conn: ConnectionManager,
        topic: &'static str,
        handler: Arc<dyn EventHandler>,
        config: &BrokerConfig,
    ) -> Self {
        let stream = Arc::new(RedisStream::new(conn, topic, config));
        Self::with_stream(stream, topic, handler, config)
    }

    pub fn with_stream(
        stream: Arc<dyn StreamOps>,
        topic: &'static str,
        handler: Arc<dyn EventHandler>,
        config: &BrokerConfig,
    ) -> Self {
        Self {
            stream,
            topic,
            handler,
            poll_interval: config.poll_interval(),
            max_in_flight: config.max_in_flight,
        }
    }

    async fn poll(
        &self,
        permits: &Arc<Semaphore>,
        in_flight: &Arc<Mutex<HashSet<String>>>,
        claim_cursor: &mut String,
    ) -> AppResult<()> {
        let capacity = permits.available_permits();
        if capacity == 0 {
            return Ok(());
        }

        let (next, mut deliveries) = self.stream.reclaim(claim_cursor, capacity).await?;
        *claim_cursor = next;
        if deliveries.len() < capacity {
            deliveries.extend(self.stream.read_new(capacity - deliveries.len()).await?);
        }

        for delivery in deliveries {
            self.dispatch(delivery, permits, in_flight).await?;
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        delivery: Delivery,
        permits: &Arc<Semaphore>,
        in_flight: &Arc<Mutex<HashSet<String>>>,
    ) -> AppResult<()> {
        let Delivery { id, payload } = delivery;

        let Some(payload) = payload else {
            warn!(topic = self.topic, id = %id, "Stream entry has no payload, dropping it");
            ack(self.stream.as_ref(), self.topic, &id).await;
            return Ok(());
        };

        // A slow handler's message may be reclaimed while still running.
        if !in_flight.lock().await.insert(id.clone()) {
            debug!(topic = self.topic, id = %id, "Message already in flight, skipping");
            return Ok(());
        }

        let permit = permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AppError::internal("in-flight semaphore closed"))?;

        let handler = self.handler.clone();
        let stream = self.stream.clone();
        let in_flight = in_flight.clone();
        let topic = self.topic;

        tokio::spawn(async move {
            let _permit = permit;

            let outcome = tokio::spawn(async move { handler.handle(&payload).await }).await;
            match outcome {
                Ok(Ok(())) => ack(stream.as_ref(), topic, &id).await,
                Ok(Err(e)) => {
                    debug!(topic, id = %id, error = %e, "Message left for redelivery");
                }
                Err(e) => {
                    error!(topic, id = %id, error = %e, "Handler panicked, message left for redelivery");
                }
            }

            in_flight.lock().await.remove(&id);
        });

        Ok(())
    }
}

#[async_trait]
impl Subscription for StreamSubscriber {
    fn topic(&self) -> &'static str {
        self.topic
    }

    async fn run(&self, shutdown: CancellationToken) -> AppResult<()> {
        let capacity = u32::try_from(self.max_in_flight)
            .map_err(|_| AppError::config(format!("max_in_flight {} is too large", self.max_in_flight)))?;

        self.stream.ensure_group().await?;
        info!(topic = self.topic, max_in_flight = self.max_in_flight, "Subscribed");

        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let in_flight = Arc::new(Mutex::new(HashSet::new()));
        let mut claim_cursor = "0-0".to_string();

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break Ok(()),
                _ = ticker.tick() => {
                    if let Err(e) = self.poll(&permits, &in_flight, &mut claim_cursor).await {
                        break Err(e);
                    }
                }
            }
        };

        let pending = self.max_in_flight - permits.available_permits();
        if pending > 0 {
            info!(topic = self.topic, pending, "Waiting for in-flight messages");
        }
        // Every spawned task holds a permit until it finishes.
        let _drained = permits.acquire_many(capacity).await;

        info!(topic = self.topic, "Subscription stopped");
        result
    }
}

/// Acknowledge a message. A failed ack only means the message is redelivered.
async fn ack(stream: &dyn StreamOps, topic: &str, id: &str) {
    if let Err(e) = stream.ack(id).await {
        warn!(topic, id, error = %e, "Failed to acknowledge message");
    }
}
