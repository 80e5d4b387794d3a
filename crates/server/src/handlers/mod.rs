//! HTTP request handlers.

pub mod accounts;
pub mod cameras;
pub mod health;
pub mod images;

pub use accounts::*;
pub use cameras::*;
pub use health::*;
pub use images::*;

use crate::error::{ApiError, ApiResult};
use axum::extract::Request;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Simple acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Read and deserialize a JSON request body, bounded by `limit` bytes.
///
/// All typed request schemas come through here so malformed bodies are
/// rejected at the boundary with a 400, before any handler logic runs.
pub(crate) async fn read_json_body<T: DeserializeOwned>(
    req: Request,
    limit: usize,
) -> ApiResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), limit)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}
