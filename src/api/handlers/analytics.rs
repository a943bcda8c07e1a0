//! Handler for per-link click analytics.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::dto::analytics::LinkAnalyticsResponse;
use crate::api::dto::pagination::PaginationParams;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the click history of a short link.
///
/// # Endpoint
///
/// `GET /api/v1/analytics/{code}?page=1&page_size=10`
///
/// Clicks are newest first. `page_size` is capped at 100. Counts are
/// at-least-once and may include a duplicate after a redelivery.
///
/// # Errors
///
/// - 400 if `page` is 0
/// - 404 if the code is unknown
pub async fn analytics_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<LinkAnalyticsResponse>, AppError> {
    let (page, page_size) = params.page_and_size();

    let analytics = state
        .analytics
        .link_analytics(&code, page, page_size)
        .await?;

    Ok(Json(analytics.into()))
}
