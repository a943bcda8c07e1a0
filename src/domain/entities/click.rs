//! Click entity representing a single persisted redirect.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A click recorded by the analytics worker.
///
/// Never mutated after creation; removed only when its short link is
/// deleted (cascade).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickRecord {
    pub id: i64,
    pub short_link_id: i64,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

impl ClickRecord {
    /// Creates a new ClickRecord instance.
    pub fn new(
        id: i64,
        short_link_id: i64,
        ip_address: String,
        user_agent: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            short_link_id,
            ip_address,
            user_agent,
            created_at,
        }
    }
}

/// Input data for recording a click.
///
/// `created_at` is the time the redirect happened, not the time the worker
/// got around to persisting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClickRecord {
    pub short_link_id: i64,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}
