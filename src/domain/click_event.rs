//! Click event model carried over the event broker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::NewClickRecord;

/// A redirect that happened, on its way to becoming a [`ClickRecord`].
///
/// Produced by the redirect path and consumed by the analytics worker. It only
/// ever exists as a queued message, encoded as flat JSON:
///
/// ```json
/// {"short_id": 7, "ip": "203.0.113.9", "user_agent": "curl/8.5", "time_stamp": "2025-01-01T00:00:00Z"}
/// ```
///
/// [`ClickRecord`]: crate::domain::entities::ClickRecord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub short_id: i64,
    pub ip: String,
    pub user_agent: String,
    pub time_stamp: DateTime<Utc>,
}

impl ClickEvent {
    /// Creates a new click event.
    pub fn new(
        short_id: i64,
        ip: impl Into<String>,
        user_agent: impl Into<String>,
        time_stamp: DateTime<Utc>,
    ) -> Self {
        Self {
            short_id,
            ip: ip.into(),
            user_agent: user_agent.into(),
            time_stamp,
        }
    }

    /// Encodes the event as a broker payload.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decodes an event from a broker payload.
    ///
    /// # Errors
    ///
    /// Returns an error for anything that is not a JSON object with all four
    /// fields. Such messages are not recoverable by redelivery.
    pub fn from_payload(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }

    /// Converts the event into a click record ready for insertion.
    pub fn into_click_record(self) -> NewClickRecord {
        NewClickRecord {
            short_link_id: self.short_id,
            ip_address: self.ip,
            user_agent: self.user_agent,
            created_at: self.time_stamp,
        }
    }
}
