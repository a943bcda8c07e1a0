//! Redis Streams implementation of the event broker.
//!
//! A queue is a stream; consumers join a single consumer group so that several
//! worker processes compete for entries.
//!
//! | Operation | Redis command |
//! |---|---|
//! | declare | `XGROUP CREATE <queue> <group> 0 MKSTREAM` |
//! | publish | `XADD <queue> * payload <bytes>` |
//! | consume | `XREADGROUP GROUP <group> <consumer> BLOCK .. STREAMS <queue> 0 / >` |
//! | take over | `XAUTOCLAIM <queue> <group> <consumer> <min-idle> <start>` |
//! | ack | `MULTI; XACK <queue> <group> <id>; XDEL <queue> <id>; EXEC` |
//! | nack | `MULTI; XADD <queue> * payload <bytes>; XACK ..; XDEL ..; EXEC` |
//!
//! Settled entries are deleted, so the stream only holds unsettled clicks.

use super::service::{BrokerError, BrokerMessage, BrokerResult, EventBroker, MessageStream};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::streams::{
    StreamAutoClaimOptions, StreamAutoClaimReply, StreamId, StreamReadOptions, StreamReadReply,
};
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Stream entry field holding the message payload.
const PAYLOAD_FIELD: &str = "payload";

/// Reads this consumer's own pending entries (delivered but never acked).
const PENDING_CURSOR: &str = "0";

/// Reads entries never delivered to any consumer of the group.
const NEW_CURSOR: &str = ">";

/// Kept short so a blocked read returns well inside the client's response timeout.
const DEFAULT_BLOCK: Duration = Duration::from_millis(200);

const DEFAULT_BATCH_SIZE: usize = 32;

const DEFAULT_CLAIM_IDLE: Duration = Duration::from_secs(30);

/// Start id for a full `XAUTOCLAIM` scan; also what Redis returns when done.
const CLAIM_SCAN_START: &str = "0-0";

/// Event broker backed by Redis Streams consumer groups.
///
/// Publishing and acknowledgements share one `ConnectionManager`. Every
/// subscription reads on its own dedicated connection, because a blocking
/// `XREADGROUP` would otherwise stall the shared one.
pub struct RedisStreamBroker {
    client: Client,
    manager: ConnectionManager,
    group: String,
    block: Duration,
    batch_size: usize,
    claim_idle: Duration,
}

impl RedisStreamBroker {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Connection`] if the URL is invalid or Redis is
    /// unreachable.
    pub async fn connect(redis_url: &str, group: impl Into<String>) -> BrokerResult<Self> {
        info!("Connecting broker to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            BrokerError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| BrokerError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| BrokerError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("✓ Broker connected to Redis");

        Ok(Self {
            client,
            manager,
            group: group.into(),
            block: DEFAULT_BLOCK,
            batch_size: DEFAULT_BATCH_SIZE,
            claim_idle: DEFAULT_CLAIM_IDLE,
        })
    }

    /// Overrides how long a read blocks and how many entries it fetches.
    pub fn with_read_options(mut self, block: Duration, batch_size: usize) -> Self {
        self.block = block;
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets how long another consumer's entry must sit unacknowledged before
    /// a subscriber takes it over. Covers consumers that crashed for good or
    /// were renamed.
    pub fn with_claim_idle(mut self, claim_idle: Duration) -> Self {
        self.claim_idle = claim_idle;
        self
    }
}

#[async_trait]
impl EventBroker for RedisStreamBroker {
    async fn declare_queue(&self, name: &str) -> BrokerResult<()> {
        let mut conn = self.manager.clone();

        match conn
            .xgroup_create_mkstream::<_, _, _, ()>(name, &self.group, "0")
            .await
        {
            Ok(()) => {
                info!(queue = name, group = %self.group, "Declared queue");
                Ok(())
            }
            Err(e) if e.code() == Some("BUSYGROUP") => {
                debug!(queue = name, group = %self.group, "Queue already declared");
                Ok(())
            }
            Err(e) => Err(BrokerError::Connection(format!(
                "XGROUP CREATE {}: {}",
                name, e
            ))),
        }
    }

    async fn publish(&self, queue: &str, payload: &[u8]) -> BrokerResult<()> {
        let mut conn = self.manager.clone();

        let id: String = conn
            .xadd(queue, "*", &[(PAYLOAD_FIELD, payload)])
            .await
            .map_err(|e| BrokerError::Publish(format!("XADD {}: {}", queue, e)))?;

        debug!(queue, id = %id, "Published message");
        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        consumer_id: &str,
        auto_ack: bool,
    ) -> BrokerResult<MessageStream> {
        let reader = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BrokerError::Connection(format!("Failed to open reader: {}", e)))?;

        let (tx, stream) = MessageStream::channel(self.batch_size);

        let subscription = Subscription {
            queue: queue.to_string(),
            group: self.group.clone(),
            consumer: consumer_id.to_string(),
            auto_ack,
            block: self.block,
            batch_size: self.batch_size,
            claim_idle: self.claim_idle,
            settler: self.manager.clone(),
        };

        info!(queue, consumer = consumer_id, auto_ack, "Subscribed to queue");
        tokio::spawn(subscription.run(reader, tx));

        Ok(stream)
    }

    async fn close(&self) {
        // Connections are released when the last clone of the manager drops.
        info!(group = %self.group, "Broker closed");
    }
}

/// Background reader feeding one [`MessageStream`].
struct Subscription {
    queue: String,
    group: String,
    consumer: String,
    auto_ack: bool,
    block: Duration,
    batch_size: usize,
    claim_idle: Duration,
    settler: ConnectionManager,
}

impl Subscription {
    /// Drains this consumer's pending entries first, then follows new ones.
    /// Once following, idle entries of other consumers are claimed on entry
    /// and then every `claim_idle`.
    ///
    /// Returns on the first read error (the connection is gone) or once the
    /// stream has been dropped; either way the sender drops and the consumer
    /// sees the stream end.
    async fn run(self, mut reader: MultiplexedConnection, tx: mpsc::Sender<Box<dyn BrokerMessage>>) {
        let mut cursor = PENDING_CURSOR.to_string();
        let block_ms = self.block.as_millis() as usize;
        let mut next_claim: Option<Instant> = None;

        loop {
            if tx.is_closed() {
                debug!(queue = %self.queue, consumer = %self.consumer, "Subscription dropped");
                return;
            }

            if cursor == NEW_CURSOR && next_claim.is_none_or(|at| Instant::now() >= at) {
                if let Err(e) = self.claim_idle_entries(&mut reader, &tx).await {
                    warn!(queue = %self.queue, error = %e, "Stream claim failed, closing subscription");
                    return;
                }
                next_claim = Some(Instant::now() + self.claim_idle);
            }

            let options = StreamReadOptions::default()
                .group(&self.group, &self.consumer)
                .count(self.batch_size)
                .block(block_ms);

            let reply: Option<StreamReadReply> = match reader
                .xread_options(&[&self.queue], &[&cursor], &options)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(queue = %self.queue, error = %e, "Stream read failed, closing subscription");
                    return;
                }
            };

            let entries: Vec<StreamId> = reply
                .map(|r| r.keys.into_iter().flat_map(|k| k.ids).collect())
                .unwrap_or_default();

            if cursor != NEW_CURSOR {
                match entries.last() {
                    Some(last) => cursor = last.id.clone(),
                    None => {
                        debug!(queue = %self.queue, consumer = %self.consumer, "Pending entries drained");
                        cursor = NEW_CURSOR.to_string();
                        continue;
                    }
                }
            }

            for entry in entries {
                let message = self.message_from(entry);

                if self.auto_ack
                    && let Err(e) = message.acknowledge().await
                {
                    warn!(queue = %self.queue, id = %message.id, error = %e, "Auto-ack failed");
                }

                if tx.send(Box::new(message)).await.is_err() {
                    return;
                }
            }
        }
    }

    /// Takes over entries other consumers left pending longer than
    /// `claim_idle` and forwards them.
    async fn claim_idle_entries(
        &self,
        reader: &mut MultiplexedConnection,
        tx: &mpsc::Sender<Box<dyn BrokerMessage>>,
    ) -> redis::RedisResult<()> {
        let min_idle_ms = self.claim_idle.as_millis() as usize;
        let mut start = CLAIM_SCAN_START.to_string();

        loop {
            let reply: StreamAutoClaimReply = reader
                .xautoclaim_options(
                    &self.queue,
                    &self.group,
                    &self.consumer,
                    min_idle_ms,
                    &start,
                    StreamAutoClaimOptions::default().count(self.batch_size),
                )
                .await?;

            if !reply.claimed.is_empty() {
                info!(
                    queue = %self.queue,
                    consumer = %self.consumer,
                    claimed = reply.claimed.len(),
                    "Claimed idle pending entries"
                );
            }

            for entry in reply.claimed {
                let message = self.message_from(entry);
                if self.auto_ack
                    && let Err(e) = message.acknowledge().await
                {
                    warn!(queue = %self.queue, id = %message.id, error = %e, "Auto-ack failed");
                }
                if tx.send(Box::new(message)).await.is_err() {
                    return Ok(());
                }
            }

            if reply.next_stream_id == CLAIM_SCAN_START || reply.next_stream_id == start {
                return Ok(());
            }
            start = reply.next_stream_id;
        }
    }

    fn message_from(&self, entry: StreamId) -> RedisStreamMessage {
        // Entries trimmed from the stream come back without fields; an empty
        // body is rejected downstream like any other malformed payload.
        let body = entry.get::<Vec<u8>>(PAYLOAD_FIELD).unwrap_or_default();

        RedisStreamMessage {
            conn: self.settler.clone(),
            queue: self.queue.clone(),
            group: self.group.clone(),
            id: entry.id,
            body,
            auto_ack: self.auto_ack,
        }
    }
}

/// A stream entry delivered to a consumer.
struct RedisStreamMessage {
    conn: ConnectionManager,
    queue: String,
    group: String,
    id: String,
    body: Vec<u8>,
    auto_ack: bool,
}

impl RedisStreamMessage {
    /// Acknowledges and deletes the entry in one transaction.
    async fn acknowledge(&self) -> BrokerResult<()> {
        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .xack(&self.queue, &self.group, &[&self.id])
            .ignore()
            .xdel(&self.queue, &[&self.id])
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| BrokerError::Ack(format!("XACK {} {}: {}", self.queue, self.id, e)))?;
        Ok(())
    }
}

#[async_trait]
impl BrokerMessage for RedisStreamMessage {
    fn body(&self) -> &[u8] {
        &self.body
    }

    async fn ack(&self) -> BrokerResult<()> {
        if self.auto_ack {
            return Ok(());
        }
        self.acknowledge().await
    }

    async fn nack(&self) -> BrokerResult<()> {
        if self.auto_ack {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .xadd(&self.queue, "*", &[(PAYLOAD_FIELD, self.body.as_slice())])
            .ignore()
            .xack(&self.queue, &self.group, &[&self.id])
            .ignore()
            .xdel(&self.queue, &[&self.id])
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| BrokerError::Ack(format!("requeue {} {}: {}", self.queue, self.id, e)))?;

        debug!(queue = %self.queue, id = %self.id, "Requeued message");
        Ok(())
    }
}
