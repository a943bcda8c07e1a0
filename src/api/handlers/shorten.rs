//! Handlers for creating, reading, listing and deleting short links.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::dto::shorten::{ShortLinkResponse, ShortenRequest, UserLinksResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Returns the canonical short link for a URL, creating it if needed.
///
/// # Endpoint
///
/// `POST /api/v1/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/a", "user_id": 1 }
/// ```
///
/// # Response
///
/// `201 Created`. Repeating the request for the same owner and URL returns the
/// same link.
///
/// ```json
/// {
///   "id": 10,
///   "user_id": 1,
///   "original_url": "https://example.com/a",
///   "short_code": "c4ed1c21",
///   "created_at": "2025-01-01T12:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - 400 if the URL is not an absolute http(s) URL
/// - 500 if the link could not be created
pub async fn create_short_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortLinkResponse>), AppError> {
    let link = state
        .shortener
        .shorten(payload.user_id, &payload.url)
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

/// `GET /api/v1/shorten/{id}`
pub async fn get_short_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ShortLinkResponse>, AppError> {
    let link = state.shortener.get_by_id(id).await?;
    Ok(Json(link.into()))
}

/// Deletes a short link and, with it, its click history.
///
/// # Endpoint
///
/// `DELETE /api/v1/shorten/{id}` → `204 No Content`
///
/// The code stops resolving immediately; cache entries are evicted as part of
/// the request.
pub async fn delete_short_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.shortener.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/users/{user_id}/shorts`
pub async fn user_shorts_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserLinksResponse>, AppError> {
    let links = state.shortener.list_by_user(user_id).await?;

    Ok(Json(UserLinksResponse {
        user_id,
        total: links.len(),
        items: links.into_iter().map(Into::into).collect(),
    }))
}
