//! API route configuration.

use crate::api::handlers::{
    analytics_handler, create_short_handler, delete_short_handler, get_short_handler,
    user_shorts_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Versioned REST API routes, nested under `/api/v1`.
///
/// # Endpoints
///
/// - `POST   /shorten`                - Shorten a URL (idempotent per owner)
/// - `GET    /shorten/{id}`           - Fetch a short link
/// - `DELETE /shorten/{id}`           - Delete a short link and its clicks
/// - `GET    /users/{user_id}/shorts` - List a user's short links
/// - `GET    /analytics/{code}`       - Paged click history for a code
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(create_short_handler))
        .route(
            "/shorten/{id}",
            get(get_short_handler).delete(delete_short_handler),
        )
        .route("/users/{user_id}/shorts", get(user_shorts_handler))
        .route("/analytics/{code}", get(analytics_handler))
}
