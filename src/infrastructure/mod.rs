//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for persistence, caching and messaging.
//!
//! # Modules
//!
//! - [`broker`] - Event broker abstraction (Redis Streams implementation)
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL repository implementations

pub mod broker;
pub mod cache;
pub mod persistence;
