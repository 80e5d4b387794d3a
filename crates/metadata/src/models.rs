//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Registered user account.
///
/// `email` is stored in normalized form; the uniqueness constraint relies on
/// normalization having happened before the row reaches this crate.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: OffsetDateTime,
}

/// Camera device record.
///
/// Created unowned during provisioning. `owner_user_id` is set exactly once
/// by the pairing compare-and-set and never cleared; `pairing_token` is the
/// device's permanent credential seed and is unique across the fleet.
#[derive(Debug, Clone, FromRow)]
pub struct CameraRow {
    pub camera_id: Uuid,
    pub pairing_token: String,
    pub owner_user_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
    pub paired_at: Option<OffsetDateTime>,
}

impl CameraRow {
    /// Whether the camera has completed pairing.
    pub fn is_paired(&self) -> bool {
        self.owner_user_id.is_some()
    }
}

/// Ingested image record.
#[derive(Debug, Clone, FromRow)]
pub struct ImageRow {
    pub image_id: Uuid,
    pub camera_id: Uuid,
    pub file_name: String,
    pub classification: String,
    pub captured_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

/// Image joined with its camera's display name, for user-facing listings.
#[derive(Debug, Clone, FromRow)]
pub struct OwnedImageRow {
    pub image_id: Uuid,
    pub camera_id: Uuid,
    pub file_name: String,
    pub classification: String,
    pub captured_at: OffsetDateTime,
    pub camera_name: Option<String>,
}
