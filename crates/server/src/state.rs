//! Application state shared across handlers.

use darkroom_core::TokenAuthority;
use darkroom_core::config::AppConfig;
use darkroom_metadata::MetadataStore;
use darkroom_storage::ObjectStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Artifact storage backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Bearer token authority.
    pub tokens: Arc<TokenAuthority>,
}

impl AppState {
    /// Create new application state.
    ///
    /// The token authority is built from the configured signing secret here,
    /// once, so every handler verifies against the same keys.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let tokens = Arc::new(TokenAuthority::new(config.auth.secret.as_bytes()));
        Self {
            config: Arc::new(config),
            storage,
            metadata,
            tokens,
        }
    }
}
