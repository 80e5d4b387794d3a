//! Server test utilities.

use darkroom_core::config::{AppConfig, MetadataConfig, StorageConfig};
use darkroom_metadata::{MetadataStore, SqliteStore};
use darkroom_server::{AppState, create_router};
use darkroom_storage::{FilesystemBackend, ObjectStore};
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server over temp storage and a temp database.
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp directory");

        let storage_path = temp_dir.path().join("storage");
        let storage: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(&storage_path)
                .await
                .expect("failed to create storage backend"),
        );

        let db_path = temp_dir.path().join("metadata.db");
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("failed to create metadata store"),
        );

        let mut config = AppConfig::for_testing();
        config.storage = StorageConfig::Filesystem {
            path: storage_path,
        };
        config.metadata = MetadataConfig::Sqlite { path: db_path };

        let state = AppState::new(config, storage, metadata);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata store.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Get access to the underlying artifact storage.
    pub fn storage(&self) -> Arc<dyn ObjectStore> {
        self.state.storage.clone()
    }
}
