//! Consumer-group operations on a single Redis stream.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, ErrorKind, RedisResult, Value};
use tracing::info;
use uuid::Uuid;

use common::{AppResult, BrokerConfig};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Stream entry field holding the JSON payload.
const PAYLOAD_FIELD: &str = "payload";

/// A message read from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: String,
    pub payload: Option<Vec<u8>>,
}

impl Delivery {
    pub fn new(id: impl Into<String>, payload: Option<&str>) -> Self {
        Self {
            id: id.into(),
            payload: payload.map(|p| p.as_bytes().to_vec()),
        }
    }
}

/// The consumer-group commands a subscriber needs from its stream.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StreamOps: Send + Sync {
    /// Create the consumer group (and the stream) unless it already exists.
    async fn ensure_group(&self) -> AppResult<()>;

    /// Claim up to `count` entries left unacknowledged for too long, starting
    /// at `cursor`. Returns the cursor for the next call.
    async fn reclaim(&self, cursor: &str, count: usize) -> AppResult<(String, Vec<Delivery>)>;

    /// Read up to `count` entries never delivered to the group before.
    async fn read_new(&self, count: usize) -> AppResult<Vec<Delivery>>;

    async fn ack(&self, id: &str) -> AppResult<()>;
}

/// [`StreamOps`] over a Redis stream named after the topic.
pub struct RedisStream {
    conn: ConnectionManager,
    topic: &'static str,
    group: String,
    consumer: String,
    redelivery_idle: Duration,
}

impl RedisStream {
    pub fn new(conn: ConnectionManager, topic: &'static str, config: &BrokerConfig) -> Self {
        Self {
            conn,
            topic,
            group: config.consumer_group.clone(),
            consumer: format!("{}-{}", config.consumer_group, Uuid::new_v4()),
            redelivery_idle: config.redelivery_idle(),
        }
    }
}

#[async_trait]
impl StreamOps for RedisStream {
    async fn ensure_group(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let created: RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(self.topic)
            .arg(&self.group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match created {
            Ok(()) => info!(topic = self.topic, group = %self.group, "Created consumer group"),
            Err(e) if e.code() == Some("BUSYGROUP") => {}
            Err(e) => return Err(e.into()),
        }

        info!(topic = self.topic, group = %self.group, consumer = %self.consumer, "Joined consumer group");
        Ok(())
    }

    async fn reclaim(&self, cursor: &str, count: usize) -> AppResult<(String, Vec<Delivery>)> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("XAUTOCLAIM")
            .arg(self.topic)
            .arg(&self.group)
            .arg(&self.consumer)
            .arg(self.redelivery_idle.as_millis() as u64)
            .arg(cursor)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        Ok(parse_autoclaim(&reply)?)
    }

    async fn read_new(&self, count: usize) -> AppResult<Vec<Delivery>> {
        let mut conn = self.conn.clone();
        let options = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(count);

        let reply: Option<StreamReadReply> = conn.xread_options(&[self.topic], &[">"], &options).await?;

        Ok(reply
            .into_iter()
            .flat_map(|reply| reply.keys)
            .flat_map(|key| key.ids)
            .map(|entry| Delivery {
                payload: entry.get::<Vec<u8>>(PAYLOAD_FIELD),
                id: entry.id,
            })
            .collect())
    }

    async fn ack(&self, id: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _acked: i64 = conn.xack(self.topic, &self.group, &[id]).await?;
        Ok(())
    }
}

/// Parse an `XAUTOCLAIM` reply into the next cursor and the claimed entries.
///
/// Entries deleted from the stream while pending come back as nil and are skipped.
fn parse_autoclaim(reply: &Value) -> RedisResult<(String, Vec<Delivery>)> {
    let parts: Vec<Value> = redis::from_redis_value(reply)?;
    let mut parts = parts.iter();

    let cursor: String = match parts.next() {
        Some(value) => redis::from_redis_value(value)?,
        None => return Err((ErrorKind::TypeError, "empty XAUTOCLAIM reply").into()),
    };

    let entries: Vec<Option<(String, HashMap<String, Vec<u8>>)>> = match parts.next() {
        Some(value) => redis::from_redis_value(value)?,
        None => Vec::new(),
    };

    let deliveries = entries
        .into_iter()
        .flatten()
        .map(|(id, mut fields)| Delivery {
            id,
            payload: fields.remove(PAYLOAD_FIELD),
        })
        .collect();

    Ok((cursor, deliveries))
}
