//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{CameraRepo, ImageRepo, OwnershipRepo, UserRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: UserRepo + CameraRepo + ImageRepo + OwnershipRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store, creating the file and schema if missing.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures under axum/test
            // concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(path = %path.display(), "sqlite metadata store initialized");

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

/// Map an insert error, turning UNIQUE violations into `AlreadyExists`.
fn map_insert_err(e: sqlx::Error, what: &str) -> MetadataError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            MetadataError::AlreadyExists(what.to_string())
        }
        _ => MetadataError::Database(e),
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::{CameraRow, ImageRow, OwnedImageRow, UserRow};
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[async_trait]
    impl UserRepo for SqliteStore {
        async fn create_user(&self, user: &UserRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO users (
                    user_id, email, password_hash, first_name, last_name, created_at
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user.user_id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_err(e, &format!("email {}", user.email)))?;
            Ok(())
        }

        async fn get_user(&self, user_id: Uuid) -> MetadataResult<Option<UserRow>> {
            let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_user_by_email(&self, email: &str) -> MetadataResult<Option<UserRow>> {
            let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }
    }

    #[async_trait]
    impl CameraRepo for SqliteStore {
        async fn create_camera(&self, camera: &CameraRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO cameras (
                    camera_id, pairing_token, owner_user_id, name, description,
                    created_at, paired_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(camera.camera_id)
            .bind(&camera.pairing_token)
            .bind(camera.owner_user_id)
            .bind(&camera.name)
            .bind(&camera.description)
            .bind(camera.created_at)
            .bind(camera.paired_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_err(e, "pairing token"))?;
            Ok(())
        }

        async fn get_camera(&self, camera_id: Uuid) -> MetadataResult<Option<CameraRow>> {
            let row = sqlx::query_as::<_, CameraRow>("SELECT * FROM cameras WHERE camera_id = ?")
                .bind(camera_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_camera_by_pairing_token(
            &self,
            pairing_token: &str,
        ) -> MetadataResult<Option<CameraRow>> {
            let row =
                sqlx::query_as::<_, CameraRow>("SELECT * FROM cameras WHERE pairing_token = ?")
                    .bind(pairing_token)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row)
        }

        async fn claim_camera(
            &self,
            pairing_token: &str,
            owner_user_id: Uuid,
            name: &str,
            description: &str,
            paired_at: OffsetDateTime,
        ) -> MetadataResult<bool> {
            // Single conditional update: the owner column moves from NULL to
            // a user exactly once, no read-then-write window. Concurrent
            // claimants race on the WHERE clause and at most one row update
            // succeeds.
            let result = sqlx::query(
                r#"
                UPDATE cameras
                SET owner_user_id = ?, name = ?, description = ?, paired_at = ?
                WHERE pairing_token = ? AND owner_user_id IS NULL
                "#,
            )
            .bind(owner_user_id)
            .bind(name)
            .bind(description)
            .bind(paired_at)
            .bind(pairing_token)
            .execute(&self.pool)
            .await?;

            Ok(result.rows_affected() == 1)
        }

        async fn list_cameras_for_user(&self, user_id: Uuid) -> MetadataResult<Vec<CameraRow>> {
            let rows = sqlx::query_as::<_, CameraRow>(
                "SELECT * FROM cameras WHERE owner_user_id = ? ORDER BY paired_at ASC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn count_cameras_for_user(&self, user_id: Uuid) -> MetadataResult<u64> {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM cameras WHERE owner_user_id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool)
                    .await?;
            Ok(count as u64)
        }
    }

    #[async_trait]
    impl ImageRepo for SqliteStore {
        async fn create_image(&self, image: &ImageRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO images (
                    image_id, camera_id, file_name, classification, captured_at, created_at
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(image.image_id)
            .bind(image.camera_id)
            .bind(&image.file_name)
            .bind(&image.classification)
            .bind(image.captured_at)
            .bind(image.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_err(e, &format!("file name {}", image.file_name)))?;
            Ok(())
        }

        async fn get_image(&self, image_id: Uuid) -> MetadataResult<Option<ImageRow>> {
            let row = sqlx::query_as::<_, ImageRow>("SELECT * FROM images WHERE image_id = ?")
                .bind(image_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn delete_image(&self, image_id: Uuid) -> MetadataResult<u64> {
            let result = sqlx::query("DELETE FROM images WHERE image_id = ?")
                .bind(image_id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        }
    }

    #[async_trait]
    impl OwnershipRepo for SqliteStore {
        async fn owns_camera(&self, user_id: Uuid, camera_id: Uuid) -> MetadataResult<bool> {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM cameras WHERE camera_id = ? AND owner_user_id = ?",
            )
            .bind(camera_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(count > 0)
        }

        async fn get_owned_image(
            &self,
            user_id: Uuid,
            image_id: Uuid,
        ) -> MetadataResult<Option<ImageRow>> {
            let row = sqlx::query_as::<_, ImageRow>(
                r#"
                SELECT i.*
                FROM images i
                JOIN cameras c ON c.camera_id = i.camera_id
                WHERE i.image_id = ? AND c.owner_user_id = ?
                "#,
            )
            .bind(image_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn images_for_user(&self, user_id: Uuid) -> MetadataResult<Vec<OwnedImageRow>> {
            let rows = sqlx::query_as::<_, OwnedImageRow>(
                r#"
                SELECT i.image_id, i.camera_id, i.file_name, i.classification,
                       i.captured_at, c.name AS camera_name
                FROM images i
                JOIN cameras c ON c.camera_id = i.camera_id
                WHERE c.owner_user_id = ?
                ORDER BY i.captured_at DESC, i.created_at DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn images_for_camera(&self, camera_id: Uuid) -> MetadataResult<Vec<OwnedImageRow>> {
            let rows = sqlx::query_as::<_, OwnedImageRow>(
                r#"
                SELECT i.image_id, i.camera_id, i.file_name, i.classification,
                       i.captured_at, c.name AS camera_name
                FROM images i
                JOIN cameras c ON c.camera_id = i.camera_id
                WHERE i.camera_id = ?
                ORDER BY i.captured_at DESC, i.created_at DESC
                "#,
            )
            .bind(camera_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn images_for_user_with_classification(
            &self,
            user_id: Uuid,
            classification: &str,
        ) -> MetadataResult<Vec<OwnedImageRow>> {
            let rows = sqlx::query_as::<_, OwnedImageRow>(
                r#"
                SELECT i.image_id, i.camera_id, i.file_name, i.classification,
                       i.captured_at, c.name AS camera_name
                FROM images i
                JOIN cameras c ON c.camera_id = i.camera_id
                WHERE c.owner_user_id = ? AND i.classification = ?
                ORDER BY i.captured_at DESC, i.created_at DESC
                "#,
            )
            .bind(user_id)
            .bind(classification)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }
}

const SCHEMA_SQL: &str = r#"
-- Users
CREATE TABLE IF NOT EXISTS users (
    user_id BLOB PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Cameras
-- owner_user_id is NULL from provisioning until pairing, then set exactly
-- once; the pairing compare-and-set relies on the NULL check in its WHERE.
CREATE TABLE IF NOT EXISTS cameras (
    camera_id BLOB PRIMARY KEY,
    pairing_token TEXT NOT NULL UNIQUE,
    owner_user_id BLOB REFERENCES users(user_id),
    name TEXT,
    description TEXT,
    created_at TEXT NOT NULL,
    paired_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_cameras_owner ON cameras(owner_user_id);

-- Images
CREATE TABLE IF NOT EXISTS images (
    image_id BLOB PRIMARY KEY,
    camera_id BLOB NOT NULL REFERENCES cameras(camera_id),
    file_name TEXT NOT NULL UNIQUE,
    classification TEXT NOT NULL,
    captured_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_images_camera ON images(camera_id, captured_at);
CREATE INDEX IF NOT EXISTS idx_images_classification ON images(classification);
"#;
