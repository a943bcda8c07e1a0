//! ShortLink entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened URL owned by an optional user.
///
/// Records are immutable once created. `short_code` is unique across all
/// links; `(user_id, original_url)` is unique per owner, with anonymous
/// links (`user_id = None`) sharing a single owner slot.
///
/// Serializable so it can be stored as a cache value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub id: i64,
    pub user_id: Option<i64>,
    pub original_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    /// Creates a new ShortLink instance.
    pub fn new(
        id: i64,
        user_id: Option<i64>,
        original_url: String,
        short_code: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            original_url,
            short_code,
            created_at,
        }
    }

    /// Returns true if this link is the one `user_id` owns for `original_url`.
    pub fn is_owned_link_for(&self, user_id: Option<i64>, original_url: &str) -> bool {
        self.user_id == user_id && self.original_url == original_url
    }
}

/// Input data for creating a new short link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortLink {
    pub user_id: Option<i64>,
    pub original_url: String,
    pub short_code: String,
}
