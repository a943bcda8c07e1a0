//! Repository trait for click records.

use crate::domain::entities::{ClickRecord, NewClickRecord};
use crate::error::StoreError;
use async_trait::async_trait;

/// Repository interface for click records.
///
/// Written only by the analytics worker; read by the analytics service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Persists a click record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingReference`] if the short link no longer
    /// exists, and [`StoreError::Unavailable`] on any other failure.
    async fn create_click_record(&self, new_click: NewClickRecord)
    -> Result<ClickRecord, StoreError>;

    /// Lists clicks for a short link, newest first.
    async fn list_by_short_link(
        &self,
        short_link_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ClickRecord>, StoreError>;

    /// Counts all clicks recorded for a short link.
    async fn count_by_short_link(&self, short_link_id: i64) -> Result<i64, StoreError>;
}
