//! DTOs for the short link endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::ShortLink;

/// Request to shorten a URL.
///
/// `user_id` is taken at face value; authentication happens in front of this
/// service. Omitting it creates an anonymous link.
#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,

    #[serde(default)]
    pub user_id: Option<i64>,
}

/// A short link as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortLinkResponse {
    pub id: i64,
    pub user_id: Option<i64>,
    pub original_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<ShortLink> for ShortLinkResponse {
    fn from(link: ShortLink) -> Self {
        Self {
            id: link.id,
            user_id: link.user_id,
            original_url: link.original_url,
            short_code: link.short_code,
            created_at: link.created_at,
        }
    }
}

/// Links owned by one user, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserLinksResponse {
    pub user_id: i64,
    pub total: usize,
    pub items: Vec<ShortLinkResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_request_user_is_optional() {
        let request: ShortenRequest =
            serde_json::from_str(r#"{"url": "https://example.com"}"#).unwrap();
        assert_eq!(request.url, "https://example.com");
        assert!(request.user_id.is_none());

        let request: ShortenRequest =
            serde_json::from_str(r#"{"url": "https://example.com", "user_id": 5}"#).unwrap();
        assert_eq!(request.user_id, Some(5));
    }
}
