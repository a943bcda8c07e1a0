//! Error types shared across layers.
//!
//! [`StoreError`] is what repositories return; it keeps unique-constraint
//! violations distinguishable so the shortener can recover from them.
//! [`AppError`] is what services surface to callers and what the HTTP
//! adapter turns into a status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

/// Which unique constraint a failed insert tripped over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueField {
    /// `short_code` is already taken (digest collision or concurrent create).
    ShortCode,
    /// The `(user_id, original_url)` pair already exists.
    OwnerAndUrl,
    /// Any other named constraint.
    Other(String),
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortCode => write!(f, "short_code"),
            Self::OwnerAndUrl => write!(f, "user_id,original_url"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Errors returned by the durable store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0}")]
    UniqueViolation(UniqueField),

    #[error("referenced row does not exist: {0}")]
    MissingReference(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    details: Value,
}

/// Errors surfaced by the application services.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    InvalidInput { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("{message}")]
    CreateFailed { message: String, details: Value },

    #[error("{message}")]
    StoreUnavailable { message: String, details: Value },
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidInput {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn create_failed(message: impl Into<String>, details: Value) -> Self {
        Self::CreateFailed {
            message: message.into(),
            details,
        }
    }

    pub fn store_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            details,
        }
    }

    /// Machine-readable error code used in response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::CreateFailed { .. } => "create_failed",
            Self::StoreUnavailable { .. } => "store_unavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::CreateFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(field) => AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": field.to_string() }),
            ),
            StoreError::MissingReference(reason) => {
                AppError::not_found("Referenced record not found", json!({ "reason": reason }))
            }
            StoreError::Unavailable(reason) => {
                AppError::store_unavailable("Store unavailable", json!({ "reason": reason }))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let (message, details) = match self {
            AppError::InvalidInput { message, details }
            | AppError::NotFound { message, details }
            | AppError::Conflict { message, details }
            | AppError::CreateFailed { message, details }
            | AppError::StoreUnavailable { message, details } => (message, details),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}
