//! Pagination query parameters.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::application::services::analytics_service::DEFAULT_PAGE_SIZE;

/// Pagination query parameters.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
/// Range checks happen in the service: page 0 is rejected, oversized pages
/// are clamped.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Returns `(page, page_size)` with defaults applied (1 and 10).
    pub fn page_and_size(&self) -> (u32, u32) {
        (
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(PaginationParams::default().page_and_size(), (1, 10));
    }

    #[test]
    fn test_parses_numbers_from_strings() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page": "3", "page_size": "50"}"#).unwrap();
        assert_eq!(params.page_and_size(), (3, 50));
    }

    #[test]
    fn test_rejects_non_numeric_page() {
        assert!(serde_json::from_str::<PaginationParams>(r#"{"page": "two"}"#).is_err());
    }
}
