//! Business logic services for the application layer.

pub mod analytics_service;
pub mod redirect_service;
pub mod shortener_service;

pub use analytics_service::{AnalyticsService, LinkAnalytics};
pub use redirect_service::RedirectService;
pub use shortener_service::ShortenerService;
