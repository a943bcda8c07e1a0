//! Event broker traits, message stream and error types.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Errors that can occur while talking to the broker.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Broker connection error: {0}")]
    Connection(String),

    #[error("Broker publish error: {0}")]
    Publish(String),

    #[error("Broker consume error: {0}")]
    Consume(String),

    #[error("Broker acknowledgement error: {0}")]
    Ack(String),
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// A delivered message that must be settled by the consumer.
///
/// `ack` removes the message from the queue for good. `nack` hands it back
/// for redelivery. On an auto-ack subscription both are no-ops.
#[async_trait]
pub trait BrokerMessage: Send + Sync {
    /// Raw payload bytes.
    fn body(&self) -> &[u8];

    /// Confirms the message was processed.
    async fn ack(&self) -> BrokerResult<()>;

    /// Rejects the message and requeues it.
    async fn nack(&self) -> BrokerResult<()>;
}

/// A live subscription to a queue.
///
/// [`MessageStream::next`] waits until a message arrives and returns `None`
/// once the underlying connection is gone. Closure is not an error; the
/// consumer decides whether to resubscribe. Dropping the stream cancels the
/// subscription.
pub struct MessageStream {
    rx: mpsc::Receiver<Box<dyn BrokerMessage>>,
}

impl MessageStream {
    /// Creates a stream together with the sender a broker feeds it through.
    ///
    /// The stream ends when every sender has been dropped.
    pub fn channel(buffer: usize) -> (mpsc::Sender<Box<dyn BrokerMessage>>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }

    /// Waits for the next message.
    pub async fn next(&mut self) -> Option<Box<dyn BrokerMessage>> {
        self.rx.recv().await
    }
}

/// Durable, ordered-per-queue message channel with consumer groups.
///
/// # Implementations
///
/// - [`crate::infrastructure::broker::RedisStreamBroker`] - Redis Streams
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventBroker: Send + Sync {
    /// Creates `name` if it does not exist. Idempotent.
    async fn declare_queue(&self, name: &str) -> BrokerResult<()>;

    /// Makes a single delivery attempt of `payload` to `queue`.
    ///
    /// There is no internal retry; retry policy belongs to the caller.
    async fn publish(&self, queue: &str, payload: &[u8]) -> BrokerResult<()>;

    /// Subscribes `consumer_id` to `queue`.
    ///
    /// Competing consumers in the same group each receive a disjoint share of
    /// the messages. With `auto_ack`, messages count as settled on delivery.
    async fn consume(
        &self,
        queue: &str,
        consumer_id: &str,
        auto_ack: bool,
    ) -> BrokerResult<MessageStream>;

    /// Releases broker connections.
    async fn close(&self);
}
