//! User repository.

use crate::error::MetadataResult;
use crate::models::UserRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for user account operations.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Create a user. Fails with `AlreadyExists` when the normalized email is
    /// already registered.
    async fn create_user(&self, user: &UserRow) -> MetadataResult<()>;

    /// Get a user by id.
    async fn get_user(&self, user_id: Uuid) -> MetadataResult<Option<UserRow>>;

    /// Get a user by normalized email.
    async fn get_user_by_email(&self, email: &str) -> MetadataResult<Option<UserRow>>;
}
