//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::StoreError;

const LINK_COLUMNS: &str = "id, user_id, original_url, short_code, created_at";

#[derive(FromRow)]
struct ShortLinkRow {
    id: i64,
    user_id: Option<i64>,
    original_url: String,
    short_code: String,
    created_at: DateTime<Utc>,
}

impl From<ShortLinkRow> for ShortLink {
    fn from(r: ShortLinkRow) -> Self {
        ShortLink::new(r.id, r.user_id, r.original_url, r.short_code, r.created_at)
    }
}

/// PostgreSQL repository for short links.
///
/// Both unique constraints live in the schema; a violated insert comes back
/// as [`StoreError::UniqueViolation`] naming the constraint it hit.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, StoreError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            r#"
            INSERT INTO short_links (user_id, original_url, short_code)
            VALUES ($1, $2, $3)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(new_link.user_id)
        .bind(&new_link.original_url)
        .bind(&new_link.short_code)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShortLink>, StoreError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM short_links WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortLink>, StoreError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM short_links WHERE short_code = $1"
        ))
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_owner_and_url(
        &self,
        user_id: Option<i64>,
        original_url: &str,
    ) -> Result<Option<ShortLink>, StoreError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM short_links
            WHERE user_id IS NOT DISTINCT FROM $1 AND original_url = $2
            "#
        ))
        .bind(user_id)
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<ShortLink>, StoreError> {
        let rows = sqlx::query_as::<_, ShortLinkRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM short_links
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM short_links WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
