//! Metadata store abstraction and implementations for Darkroom.
//!
//! This crate provides the control-plane data model:
//! - User accounts and credential digests
//! - Camera devices, pairing tokens, and the ownership claim
//! - Image records keyed by derived file name
//! - Ownership queries over the User -> Camera -> Image chain

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use store::{MetadataStore, SqliteStore};

use darkroom_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}
