//! Classification of sqlx errors into [`StoreError`].

use crate::error::{StoreError, UniqueField};

/// Unique constraint on `short_links.short_code`.
pub const SHORT_CODE_CONSTRAINT: &str = "short_links_short_code_key";

/// Unique constraint on `short_links (user_id, original_url)`.
pub const OWNER_URL_CONSTRAINT: &str = "short_links_owner_url_key";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        let Some(db_err) = e.as_database_error() else {
            return StoreError::Unavailable(e.to_string());
        };

        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation(unique_field(db_err.constraint()));
        }

        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(db_err.message().to_string());
        }

        StoreError::Unavailable(e.to_string())
    }
}

fn unique_field(constraint: Option<&str>) -> UniqueField {
    match constraint {
        Some(SHORT_CODE_CONSTRAINT) => UniqueField::ShortCode,
        Some(OWNER_URL_CONSTRAINT) => UniqueField::OwnerAndUrl,
        Some(other) => UniqueField::Other(other.to_string()),
        None => UniqueField::Other("unknown".to_string()),
    }
}
