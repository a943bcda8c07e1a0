//! Long-running consumer turning click events into click records.
//!
//! ```text
//! Connecting ──ok──▶ Consuming ──stream closed──▶ Reconnecting ──backoff──▶ Connecting
//!     │                  │                             │
//!     └─first failure    └──────── cancelled ──────────┴──▶ ShuttingDown
//!       (returned)
//! ```
//!
//! Delivery is at-least-once. A record is acknowledged only after the store
//! accepted it; a store failure requeues the message, so a redelivered click
//! may be counted twice. Consecutive requeues pause the loop with the same
//! capped exponential delays used for reconnects, so a store outage does not
//! turn into a hot redelivery loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::ClickRepository;
use crate::error::StoreError;
use crate::infrastructure::broker::{
    BrokerError, BrokerMessage, BrokerResult, EventBroker, MessageStream,
};

/// Where to consume from and how to back off between reconnects.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub queue: String,
    pub consumer_id: String,
    pub reconnect_base: Duration,
    pub reconnect_max: Duration,
}

impl WorkerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            queue: config.click_queue.clone(),
            consumer_id: config.click_consumer_id.clone(),
            reconnect_base: Duration::from_millis(config.worker_reconnect_base_ms),
            reconnect_max: Duration::from_millis(config.worker_reconnect_max_ms),
        }
    }
}

/// What happened to a single delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Persisted and acknowledged.
    Recorded,
    /// Acknowledged without persisting: malformed, or its link is gone.
    Dropped,
    /// Rejected for redelivery after a store failure.
    Requeued,
}

enum State {
    Connecting,
    Consuming(MessageStream),
    Reconnecting,
    ShuttingDown,
}

/// Consumer loop for the click queue.
pub struct AnalyticsWorker<C: ClickRepository + ?Sized = dyn ClickRepository> {
    broker: Arc<dyn EventBroker>,
    clicks: Arc<C>,
    settings: WorkerSettings,
}

impl<C: ClickRepository + ?Sized> AnalyticsWorker<C> {
    pub fn new(broker: Arc<dyn EventBroker>, clicks: Arc<C>, settings: WorkerSettings) -> Self {
        Self {
            broker,
            clicks,
            settings,
        }
    }

    /// Runs until `cancel` fires.
    ///
    /// Cancellation is observed between messages; a message already being
    /// processed is settled before the loop exits.
    ///
    /// # Errors
    ///
    /// Returns the broker error if the very first connection attempt fails.
    /// Later connection losses are retried indefinitely.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), BrokerError> {
        let mut backoff = self.backoff();
        let mut connected_once = false;
        let mut state = State::Connecting;

        loop {
            state = match state {
                State::Connecting if cancel.is_cancelled() => State::ShuttingDown,
                State::Connecting => match self.connect().await {
                    Ok(stream) => {
                        info!(
                            queue = %self.settings.queue,
                            consumer = %self.settings.consumer_id,
                            "Analytics worker consuming"
                        );
                        connected_once = true;
                        backoff = self.backoff();
                        State::Consuming(stream)
                    }
                    Err(e) if !connected_once => {
                        error!(error = %e, "Analytics worker failed to connect");
                        return Err(e);
                    }
                    Err(e) => {
                        warn!(error = %e, "Reconnect attempt failed");
                        State::Reconnecting
                    }
                },
                State::Consuming(mut stream) => self.consume(&mut stream, &cancel).await,
                State::Reconnecting => {
                    let delay = backoff.next().unwrap_or(self.settings.reconnect_max);
                    metrics::counter!("analytics_reconnects_total").increment(1);
                    info!(delay_ms = delay.as_millis() as u64, "Reconnecting to broker");

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => State::ShuttingDown,
                        _ = tokio::time::sleep(delay) => State::Connecting,
                    }
                }
                State::ShuttingDown => {
                    info!("Analytics worker stopped");
                    return Ok(());
                }
            };
        }
    }

    /// Decodes, persists and settles one message.
    pub async fn handle_message(&self, message: &dyn BrokerMessage) -> MessageOutcome {
        let event = match ClickEvent::from_payload(message.body()) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, bytes = message.body().len(), "Dropping malformed click event");
                settle(message.ack().await, "ack");
                metrics::counter!("analytics_clicks_dropped_total", "reason" => "malformed")
                    .increment(1);
                return MessageOutcome::Dropped;
            }
        };

        let short_link_id = event.short_id;

        match self.clicks.create_click_record(event.into_click_record()).await {
            Ok(record) => {
                settle(message.ack().await, "ack");
                metrics::counter!("analytics_clicks_recorded_total").increment(1);
                debug!(short_link_id, click_id = record.id, "Click recorded");
                MessageOutcome::Recorded
            }
            Err(StoreError::MissingReference(reason)) => {
                // The link was deleted; its clicks would be cascade-deleted anyway.
                warn!(short_link_id, %reason, "Dropping click for deleted link");
                settle(message.ack().await, "ack");
                metrics::counter!("analytics_clicks_dropped_total", "reason" => "missing_link")
                    .increment(1);
                MessageOutcome::Dropped
            }
            Err(e) => {
                error!(short_link_id, error = %e, "Failed to record click, requeueing");
                settle(message.nack().await, "nack");
                metrics::counter!("analytics_clicks_requeued_total").increment(1);
                MessageOutcome::Requeued
            }
        }
    }

    async fn connect(&self) -> BrokerResult<MessageStream> {
        self.broker.declare_queue(&self.settings.queue).await?;
        self.broker
            .consume(&self.settings.queue, &self.settings.consumer_id, false)
            .await
    }

    async fn consume(&self, stream: &mut MessageStream, cancel: &CancellationToken) -> State {
        let mut requeue_delays = self.delays();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return State::ShuttingDown,
                next = stream.next() => next,
            };

            match next {
                Some(message) => {
                    if self.handle_message(message.as_ref()).await != MessageOutcome::Requeued {
                        requeue_delays = self.delays();
                        continue;
                    }

                    let delay = requeue_delays.next().unwrap_or(self.settings.reconnect_max);
                    debug!(delay_ms = delay.as_millis() as u64, "Pausing after requeue");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return State::ShuttingDown,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => {
                    warn!(queue = %self.settings.queue, "Click stream closed");
                    return State::Reconnecting;
                }
            }
        }
    }

    /// Exponential delays starting at `reconnect_base`, capped at
    /// `reconnect_max`.
    fn delays(&self) -> ExponentialBackoff {
        let base_ms = (self.settings.reconnect_base.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(base_ms)
            .max_delay(self.settings.reconnect_max)
    }

    /// [`Self::delays`] with full jitter, for reconnects.
    fn backoff(&self) -> impl Iterator<Item = Duration> {
        self.delays().map(jitter)
    }
}

fn settle(result: BrokerResult<()>, action: &str) {
    if let Err(e) = result {
        warn!(action, error = %e, "Failed to settle message");
    }
}
