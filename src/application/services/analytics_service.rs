//! Read side of the click pipeline.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::domain::entities::{ClickRecord, ShortLink};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of clicks for a short link, plus the overall count.
#[derive(Debug, Clone, Serialize)]
pub struct LinkAnalytics {
    pub link: ShortLink,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub clicks: Vec<ClickRecord>,
}

/// Service for click analytics queries.
///
/// Counts are at-least-once: a click redelivered after a partial failure may
/// appear twice.
pub struct AnalyticsService<
    L: LinkRepository + ?Sized = dyn LinkRepository,
    C: ClickRepository + ?Sized = dyn ClickRepository,
> {
    links: Arc<L>,
    clicks: Arc<C>,
}

impl<L: LinkRepository + ?Sized, C: ClickRepository + ?Sized> AnalyticsService<L, C> {
    /// Creates a new analytics service.
    pub fn new(links: Arc<L>, clicks: Arc<C>) -> Self {
        Self { links, clicks }
    }

    /// Returns the clicks recorded for `short_code`, newest first.
    ///
    /// `page` is 1-based. `page_size` is clamped to `1..=100`.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidInput`] if `page` is 0
    /// - [`AppError::NotFound`] if no link has this code
    pub async fn link_analytics(
        &self,
        short_code: &str,
        page: u32,
        page_size: u32,
    ) -> Result<LinkAnalytics, AppError> {
        if page == 0 {
            return Err(AppError::invalid_input(
                "Page must be greater than 0",
                json!({ "page": page }),
            ));
        }
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

        let link = self
            .links
            .find_by_code(short_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Short link not found", json!({ "short_code": short_code }))
            })?;

        let limit = i64::from(page_size);
        let offset = i64::from(page - 1) * limit;

        let total = self.clicks.count_by_short_link(link.id).await?;
        let clicks = self
            .clicks
            .list_by_short_link(link.id, limit, offset)
            .await?;

        Ok(LinkAnalytics {
            link,
            total,
            page,
            page_size,
            clicks,
        })
    }
}
