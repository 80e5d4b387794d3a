//! Image artifact variants and storage naming.

use crate::error::{Error, Result};
use std::fmt;
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;
use uuid::Uuid;

/// Stored representations of an uploaded image.
///
/// Every ingested image produces exactly one artifact per variant, living
/// under the variant's top-level storage bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageVariant {
    /// The original uploaded bytes.
    Full,
    /// Bounded-dimension derivative (longest edge <= 128 px).
    Thumbnail,
}

impl ImageVariant {
    /// Parse from a path segment.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(Self::Full),
            "thumbnail" => Ok(Self::Thumbnail),
            _ => Err(Error::InvalidFileName(format!("unknown variant: {s}"))),
        }
    }

    /// Get the string representation (also the storage bucket name).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Thumbnail => "thumbnail",
        }
    }

    /// Storage key for a file name under this variant's bucket.
    pub fn key(&self, file_name: &str) -> String {
        format!("{}/{}", self.as_str(), file_name)
    }
}

impl fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const FILE_NAME_TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year][month][day][hour][minute][second]");

/// Maximum same-second naming attempts for a single upload.
pub const MAX_NAME_ATTEMPTS: u32 = 5;

/// Derive the stored file name for an upload.
///
/// Names are deterministic per `(camera, second)`. `attempt` disambiguates
/// uploads from the same camera within the same second; it appears as a
/// suffix only when non-zero, so the common case keeps the plain name.
pub fn derive_file_name(
    camera_id: Uuid,
    captured_at: OffsetDateTime,
    attempt: u32,
) -> Result<String> {
    let stamp = captured_at
        .format(FILE_NAME_TIMESTAMP)
        .map_err(|e| Error::InvalidFileName(e.to_string()))?;

    if attempt == 0 {
        Ok(format!("{camera_id}_{stamp}.jpg"))
    } else {
        Ok(format!("{camera_id}_{stamp}_{attempt}.jpg"))
    }
}
