//! Artifact storage abstraction and backends for Darkroom.
//!
//! This crate provides:
//! - The `ObjectStore` trait over which image artifacts are written and read
//! - Atomic, no-silent-overwrite writes for collision-safe artifact naming
//! - Backend: local filesystem

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use error::{StorageError, StorageResult};
pub use traits::{ByteStream, ObjectStore};

use darkroom_core::config::StorageConfig;
use std::sync::Arc;

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}
