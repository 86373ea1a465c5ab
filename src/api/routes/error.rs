//! API error handling.
//!
//! Every handler returns `Result<_, ApiError>`; the error renders as a
//! JSON body with a matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::storage::StorageError;

/// API error response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid session
    #[error("authentication required")]
    Unauthorized,
    /// Authenticated but not allowed
    #[error("forbidden")]
    Forbidden,
    /// Record does not exist
    #[error("not found")]
    NotFound,
    /// Request body failed validation
    #[error("{0}")]
    Validation(String),
    /// Request conflicts with a guard rule (closed record, referenced record)
    #[error("{0}")]
    Conflict(String),
    /// Login attempt quota exhausted
    #[error("too many login attempts")]
    RateLimited,
    /// Database failure
    #[error("database error")]
    Database(#[from] sqlx::Error),
    /// Attachment storage failure
    #[error("storage error")]
    Storage(#[from] StorageError),
    /// Unexpected internal failure
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Database(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(e) => tracing::error!("database error: {}", e),
            ApiError::Storage(e) => tracing::error!("storage error: {}", e),
            ApiError::Internal(e) => tracing::error!("internal error: {}", e),
            _ => {}
        }

        let status = self.status();
        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
