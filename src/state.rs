//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{AnalyticsService, RedirectService, ShortenerService};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::infrastructure::broker::EventBroker;
use crate::infrastructure::cache::CacheService;

/// Services and backends behind the HTTP adapter.
///
/// Everything is built once at startup and shared through `Arc`s; there is no
/// global client state.
#[derive(Clone)]
pub struct AppState {
    pub shortener: Arc<ShortenerService>,
    pub redirects: Arc<RedirectService>,
    pub analytics: Arc<AnalyticsService>,
    pub links: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
}

impl AppState {
    /// Wires the services on top of the given backends.
    pub fn new(
        links: Arc<dyn LinkRepository>,
        clicks: Arc<dyn ClickRepository>,
        cache: Arc<dyn CacheService>,
        broker: Arc<dyn EventBroker>,
        cache_ttl: Duration,
        click_queue: impl Into<String>,
    ) -> Self {
        let shortener = Arc::new(ShortenerService::new(
            Arc::clone(&links),
            Arc::clone(&cache),
            cache_ttl,
        ));
        let redirects = Arc::new(RedirectService::new(
            Arc::clone(&shortener),
            broker,
            click_queue,
        ));
        let analytics = Arc::new(AnalyticsService::new(Arc::clone(&links), clicks));

        Self {
            shortener,
            redirects,
            analytics,
            links,
            cache,
        }
    }
}
