//! Redirect hot path: resolve, publish a click out of band, return the target.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::application::services::ShortenerService;
use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::infrastructure::broker::EventBroker;

/// Resolves short codes for redirects and reports each hit as a click event.
///
/// The publish runs on its own task; redirect latency is bounded by
/// [`ShortenerService::resolve`] alone and a broker outage never fails a
/// redirect.
pub struct RedirectService {
    shortener: Arc<ShortenerService>,
    broker: Arc<dyn EventBroker>,
    queue: String,
}

impl RedirectService {
    /// Creates a redirect service publishing clicks to `queue`.
    pub fn new(
        shortener: Arc<ShortenerService>,
        broker: Arc<dyn EventBroker>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            shortener,
            broker,
            queue: queue.into(),
        }
    }

    /// Returns the URL to redirect to.
    ///
    /// # Errors
    ///
    /// Propagates [`ShortenerService::resolve`] errors, typically
    /// [`AppError::NotFound`]. Publishing never produces an error here.
    pub async fn handle_redirect(
        &self,
        short_code: &str,
        source_ip: &str,
        user_agent: &str,
    ) -> Result<String, AppError> {
        let link = self.shortener.resolve(short_code).await?;

        let event = ClickEvent::new(link.id, source_ip, user_agent, Utc::now());
        self.publish_detached(event);

        Ok(link.original_url)
    }

    fn publish_detached(&self, event: ClickEvent) {
        let broker = Arc::clone(&self.broker);
        let queue = self.queue.clone();

        tokio::spawn(async move {
            let payload = match event.to_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(short_link_id = event.short_id, error = %e, "Failed to encode click event");
                    metrics::counter!("redirect_publish_failures_total").increment(1);
                    return;
                }
            };

            match broker.publish(&queue, &payload).await {
                Ok(()) => debug!(short_link_id = event.short_id, queue = %queue, "Click event published"),
                Err(e) => {
                    warn!(short_link_id = event.short_id, queue = %queue, error = %e, "Click event lost");
                    metrics::counter!("redirect_publish_failures_total").increment(1);
                }
            }
        });
    }
}
