//! Domain layer containing business entities and logic.
//!
//! It defines entities, repository interfaces and the click consumer,
//! independent of the concrete backends in [`crate::infrastructure`].
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - Click event carried over the broker
//! - [`analytics_worker`] - Consumer loop persisting click events
//!
//! # Click Processing Flow
//!
//! 1. The redirect path resolves a code and publishes a [`click_event::ClickEvent`]
//! 2. The event waits in the broker queue until a worker takes it
//! 3. [`analytics_worker::AnalyticsWorker`] persists it via [`repositories::ClickRepository`]
//! 4. The message is acknowledged, or requeued if the store failed

pub mod analytics_worker;
pub mod click_event;
pub mod entities;
pub mod repositories;
