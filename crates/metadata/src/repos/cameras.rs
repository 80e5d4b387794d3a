//! Camera repository.

use crate::error::MetadataResult;
use crate::models::CameraRow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Repository for camera device operations.
#[async_trait]
pub trait CameraRepo: Send + Sync {
    /// Create a camera row (provisioning). Fails with `AlreadyExists` when
    /// the pairing token is already known to the fleet.
    async fn create_camera(&self, camera: &CameraRow) -> MetadataResult<()>;

    /// Get a camera by id.
    async fn get_camera(&self, camera_id: Uuid) -> MetadataResult<Option<CameraRow>>;

    /// Get a camera by its pairing token.
    async fn get_camera_by_pairing_token(
        &self,
        pairing_token: &str,
    ) -> MetadataResult<Option<CameraRow>>;

    /// Atomically claim an unowned camera for a user.
    ///
    /// This is the pairing state transition: a single conditional update that
    /// succeeds iff the pairing token matches an unowned row. Returns true
    /// when this caller won the claim; false when the token is unknown or the
    /// camera already has an owner. Ownership is never cleared or reassigned.
    async fn claim_camera(
        &self,
        pairing_token: &str,
        owner_user_id: Uuid,
        name: &str,
        description: &str,
        paired_at: OffsetDateTime,
    ) -> MetadataResult<bool>;

    /// List cameras owned by a user.
    async fn list_cameras_for_user(&self, user_id: Uuid) -> MetadataResult<Vec<CameraRow>>;

    /// Count cameras owned by a user.
    async fn count_cameras_for_user(&self, user_id: Uuid) -> MetadataResult<u64>;
}
