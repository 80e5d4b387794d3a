//! Startup provisioning of camera devices.

use darkroom_core::config::ProvisionConfig;
use darkroom_metadata::models::CameraRow;
use darkroom_metadata::repos::CameraRepo;
use darkroom_metadata::{MetadataError, MetadataResult, MetadataStore};
use time::OffsetDateTime;
use uuid::Uuid;

/// Ensure every configured pairing token has a camera row.
///
/// This is the administrative entry into the pairing lifecycle: each listed
/// token becomes an unowned camera (state "provisioned") if the fleet does
/// not already know it. Existing rows, paired or not, are never touched, so
/// re-running at every startup is safe. Returns the number of rows created.
pub async fn ensure_provisioned_cameras(
    metadata: &dyn MetadataStore,
    config: &ProvisionConfig,
) -> MetadataResult<usize> {
    let mut created = 0;

    for token in &config.tokens {
        let token = token.trim();
        if token.is_empty() {
            tracing::warn!("ignoring empty pairing token in provision config");
            continue;
        }

        if metadata.get_camera_by_pairing_token(token).await?.is_some() {
            continue;
        }

        let camera = CameraRow {
            camera_id: Uuid::new_v4(),
            pairing_token: token.to_string(),
            owner_user_id: None,
            name: None,
            description: None,
            created_at: OffsetDateTime::now_utc(),
            paired_at: None,
        };

        match metadata.create_camera(&camera).await {
            Ok(()) => {
                tracing::info!(camera_id = %camera.camera_id, "provisioned camera");
                created += 1;
            }
            // Another instance raced us between lookup and insert.
            Err(MetadataError::AlreadyExists(_)) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(created)
}
