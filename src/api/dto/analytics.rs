//! DTOs for the link analytics endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::dto::shorten::ShortLinkResponse;
use crate::application::services::LinkAnalytics;
use crate::domain::entities::ClickRecord;

/// A single recorded click.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClickResponse {
    pub id: i64,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

impl From<ClickRecord> for ClickResponse {
    fn from(click: ClickRecord) -> Self {
        Self {
            id: click.id,
            ip_address: click.ip_address,
            user_agent: click.user_agent,
            created_at: click.created_at,
        }
    }
}

/// Paged click history for one short link.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkAnalyticsResponse {
    pub short_link: ShortLinkResponse,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub clicks: Vec<ClickResponse>,
}

impl From<LinkAnalytics> for LinkAnalyticsResponse {
    fn from(analytics: LinkAnalytics) -> Self {
        Self {
            short_link: analytics.link.into(),
            total: analytics.total,
            page: analytics.page,
            page_size: analytics.page_size,
            clicks: analytics.clicks.into_iter().map(Into::into).collect(),
        }
    }
}
