//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
///
/// `NotFound` is the unified existence-or-ownership failure: callers cannot
/// tell a missing image from someone else's image. Conflicts (duplicate
/// email, already-paired device) surface as 400 per the public contract.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage error: {0}")]
    Storage(#[from] darkroom_storage::StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] darkroom_metadata::MetadataError),
}

impl From<darkroom_core::Error> for ApiError {
    fn from(e: darkroom_core::Error) -> Self {
        use darkroom_core::Error;
        match e {
            Error::TokenExpired | Error::TokenMalformed(_) | Error::TokenSignature => {
                Self::Unauthorized(e.to_string())
            }
            Error::InvalidEmail(_) | Error::InvalidFileName(_) => Self::BadRequest(e.to_string()),
        }
    }
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
            Self::Storage(_) => "storage_error",
            Self::Metadata(e) => match e {
                darkroom_metadata::MetadataError::AlreadyExists(_) => "conflict",
                darkroom_metadata::MetadataError::NotFound(_) => "not_found",
                _ => "storage_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            // The public surface reports conflicts as plain 400s.
            Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Metadata(e) => match e {
                darkroom_metadata::MetadataError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
                darkroom_metadata::MetadataError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 5xx detail stays in the logs; the response body is opaque.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal storage error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            code: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
