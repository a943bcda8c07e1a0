//! PostgreSQL implementation of click repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{ClickRecord, NewClickRecord};
use crate::domain::repositories::ClickRepository;
use crate::error::StoreError;

#[derive(FromRow)]
struct ClickRecordRow {
    id: i64,
    short_link_id: i64,
    ip_address: String,
    user_agent: String,
    created_at: DateTime<Utc>,
}

impl From<ClickRecordRow> for ClickRecord {
    fn from(r: ClickRecordRow) -> Self {
        ClickRecord::new(r.id, r.short_link_id, r.ip_address, r.user_agent, r.created_at)
    }
}

/// PostgreSQL repository for click records.
///
/// `click_records.short_link_id` references `short_links` with
/// `ON DELETE CASCADE`, so inserting a click for a deleted link fails with
/// [`StoreError::MissingReference`].
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn create_click_record(
        &self,
        new_click: NewClickRecord,
    ) -> Result<ClickRecord, StoreError> {
        let row = sqlx::query_as::<_, ClickRecordRow>(
            r#"
            INSERT INTO click_records (short_link_id, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, short_link_id, ip_address, user_agent, created_at
            "#,
        )
        .bind(new_click.short_link_id)
        .bind(&new_click.ip_address)
        .bind(&new_click.user_agent)
        .bind(new_click.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn list_by_short_link(
        &self,
        short_link_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ClickRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ClickRecordRow>(
            r#"
            SELECT id, short_link_id, ip_address, user_agent, created_at
            FROM click_records
            WHERE short_link_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(short_link_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_by_short_link(&self, short_link_id: i64) -> Result<i64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM click_records WHERE short_link_id = $1")
                .bind(short_link_id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }
}
