//! Ownership queries over the User -> Camera -> Image containment chain.
//!
//! Pure query-time derivation; nothing here writes. These predicates are the
//! only authorization path for retrieval, listing, and deletion: every
//! user-facing image operation must pass through exactly one of them before
//! touching artifact bytes or rows.

use crate::error::MetadataResult;
use crate::models::{ImageRow, OwnedImageRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Ownership-scoped queries.
#[async_trait]
pub trait OwnershipRepo: Send + Sync {
    /// Whether the camera exists and is owned by the user.
    async fn owns_camera(&self, user_id: Uuid, camera_id: Uuid) -> MetadataResult<bool>;

    /// Get an image iff its camera is owned by the user.
    ///
    /// Returns `None` both when the image does not exist and when it belongs
    /// to someone else; callers cannot distinguish the two.
    async fn get_owned_image(
        &self,
        user_id: Uuid,
        image_id: Uuid,
    ) -> MetadataResult<Option<ImageRow>>;

    /// All images across the user's cameras, newest first.
    async fn images_for_user(&self, user_id: Uuid) -> MetadataResult<Vec<OwnedImageRow>>;

    /// Images of a single camera, newest first. Callers must have verified
    /// ownership of the camera via `owns_camera`.
    async fn images_for_camera(&self, camera_id: Uuid) -> MetadataResult<Vec<OwnedImageRow>>;

    /// Images across the user's cameras carrying a classification label,
    /// newest first.
    async fn images_for_user_with_classification(
        &self,
        user_id: Uuid,
        classification: &str,
    ) -> MetadataResult<Vec<OwnedImageRow>>;
}
