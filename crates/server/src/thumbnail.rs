//! Thumbnail generation.

use crate::error::{ApiError, ApiResult};
use bytes::Bytes;
use darkroom_core::THUMBNAIL_MAX_DIM;
use image::ImageFormat;
use std::io::Cursor;

enum ThumbnailError {
    /// The payload did not decode as an image.
    Decode(image::ImageError),
    /// The resized image failed to encode.
    Encode(image::ImageError),
}

/// Decode `data` and produce a bounded-dimension JPEG thumbnail.
///
/// The longest edge is capped at [`THUMBNAIL_MAX_DIM`] with aspect ratio
/// preserved; images already within bounds are re-encoded as-is. Decode and
/// re-encode are CPU-bound and run on a blocking thread.
///
/// A decode failure means the payload was not an image, whatever its declared
/// media type said, and surfaces as a 400.
pub async fn generate(data: Bytes) -> ApiResult<Bytes> {
    let result = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ThumbnailError> {
        let decoded = image::load_from_memory(&data).map_err(ThumbnailError::Decode)?;
        let bounded = decoded.thumbnail(THUMBNAIL_MAX_DIM, THUMBNAIL_MAX_DIM);

        // JPEG has no alpha channel; flatten before encoding.
        let flattened = image::DynamicImage::ImageRgb8(bounded.into_rgb8());
        let mut out = Cursor::new(Vec::new());
        flattened
            .write_to(&mut out, ImageFormat::Jpeg)
            .map_err(ThumbnailError::Encode)?;
        Ok(out.into_inner())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("thumbnail task failed: {e}")))?;

    match result {
        Ok(encoded) => Ok(Bytes::from(encoded)),
        Err(ThumbnailError::Decode(e)) => {
            Err(ApiError::BadRequest(format!("not an image: {e}")))
        }
        Err(ThumbnailError::Encode(e)) => {
            Err(ApiError::Internal(format!("thumbnail encoding failed: {e}")))
        }
    }
}
