//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("token expired")]
    TokenExpired,

    #[error("malformed token: {0}")]
    TokenMalformed(String),

    #[error("invalid token signature")]
    TokenSignature,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
