//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Resolve the code (cache first, one store lookup on a miss)
/// 2. Publish a click event on a detached task
/// 3. Return 302 Found with the original URL in `Location`
///
/// The response never waits for the broker; a failed publish only costs the
/// click record.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let target = state
        .redirects
        .handle_redirect(&code, &addr.ip().to_string(), user_agent)
        .await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, target)]))
}
