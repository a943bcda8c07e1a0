//! Repository trait for short link data access.

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::error::StoreError;
use async_trait::async_trait;

/// Repository interface for short links.
///
/// The store enforces two unique constraints, on `short_code` and on
/// `(user_id, original_url)`. They are the only concurrency control the
/// shortener relies on.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] naming the violated field if the
    /// code or the `(user_id, original_url)` pair already exists.
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, StoreError>;

    /// Finds a link by its surrogate id.
    async fn find_by_id(&self, id: i64) -> Result<Option<ShortLink>, StoreError>;

    /// Finds a link by its short code.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortLink>, StoreError>;

    /// Finds the link `user_id` owns for `original_url`.
    ///
    /// `None` matches anonymous links only.
    async fn find_by_owner_and_url(
        &self,
        user_id: Option<i64>,
        original_url: &str,
    ) -> Result<Option<ShortLink>, StoreError>;

    /// Lists every link owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<ShortLink>, StoreError>;

    /// Deletes a link and, by cascade, its click records.
    ///
    /// Returns `Ok(false)` if no row with that id existed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Verifies the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
