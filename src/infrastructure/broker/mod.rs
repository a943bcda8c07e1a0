//! Event broker carrying click events from the redirect path to the
//! analytics worker.
//!
//! Provides the [`EventBroker`] trait and a Redis Streams implementation,
//! [`RedisStreamBroker`].

mod redis_stream;
mod service;

pub use redis_stream::RedisStreamBroker;
pub use service::{BrokerError, BrokerMessage, BrokerResult, EventBroker, MessageStream};

#[cfg(test)]
pub use service::MockEventBroker;
