//! Image repository.

use crate::error::MetadataResult;
use crate::models::ImageRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for image metadata operations.
#[async_trait]
pub trait ImageRepo: Send + Sync {
    /// Insert an image row. Fails with `AlreadyExists` when the derived file
    /// name is already recorded.
    async fn create_image(&self, image: &ImageRow) -> MetadataResult<()>;

    /// Get an image by id, without any ownership scoping. Ingestion-side
    /// only; user-facing reads go through `OwnershipRepo`.
    async fn get_image(&self, image_id: Uuid) -> MetadataResult<Option<ImageRow>>;

    /// Delete an image row. Returns the number of rows removed.
    async fn delete_image(&self, image_id: Uuid) -> MetadataResult<u64>;
}
