//! Application layer services implementing business logic.
//!
//! Services orchestrate repository, cache and broker calls. They consume the
//! traits from [`crate::domain::repositories`] and [`crate::infrastructure`]
//! and give HTTP handlers and the worker binary a typed API.
//!
//! # Available Services
//!
//! - [`services::shortener_service::ShortenerService`] - Dedupe and cache-aside for short links
//! - [`services::redirect_service::RedirectService`] - Redirect hot path with click publishing
//! - [`services::analytics_service::AnalyticsService`] - Click analytics queries

pub mod services;
