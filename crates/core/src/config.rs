//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted upload body size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024 // 32 MiB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for artifact buckets.
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/storage"),
        }
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database file.
    Sqlite {
        /// Path to the database file.
        path: PathBuf,
    },
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/metadata.db"),
        }
    }
}

/// Bearer token configuration.
///
/// The signing secret is required for server operation and is loaded exactly
/// once at startup; there is no key rotation in this design.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token signing secret.
    pub secret: String,
    /// Lifetime of user tokens issued at login, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub user_token_ttl_secs: u64,
    /// Lifetime of device tokens issued at check_pair, in seconds.
    #[serde(default = "default_token_ttl_secs")]
    pub device_token_ttl_secs: u64,
}

fn default_token_ttl_secs() -> u64 {
    3600 // 1 hour
}

impl AuthConfig {
    /// Get the user token lifetime as a Duration.
    pub fn user_token_ttl(&self) -> Duration {
        // Saturate at i64::MAX to prevent overflow wrapping to negative
        Duration::seconds(i64::try_from(self.user_token_ttl_secs).unwrap_or(i64::MAX))
    }

    /// Get the device token lifetime as a Duration.
    pub fn device_token_ttl(&self) -> Duration {
        Duration::seconds(i64::try_from(self.device_token_ttl_secs).unwrap_or(i64::MAX))
    }

    /// Create a test configuration with a fixed secret.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            secret: "test-signing-secret-not-for-production".to_string(),
            user_token_ttl_secs: default_token_ttl_secs(),
            device_token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

/// Device provisioning configuration.
///
/// Pairing tokens listed here are inserted as unowned camera rows at startup
/// (idempotently); this is the administrative entry point of the pairing
/// lifecycle.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Pairing tokens to pre-provision.
    #[serde(default)]
    pub tokens: Vec<String>,
}

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub provision: ProvisionConfig,
}

impl AppConfig {
    /// Create a test configuration with defaults and a fixed signing secret.
    ///
    /// **For testing only.** Storage and metadata paths still point at the
    /// defaults; tests override them with temp directories.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            metadata: MetadataConfig::default(),
            auth: AuthConfig::for_testing(),
            provision: ProvisionConfig::default(),
        }
    }
}
