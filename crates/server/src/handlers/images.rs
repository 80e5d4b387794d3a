//! Image ingestion, retrieval, and deletion.

use crate::auth::{require_device, require_user};
use crate::error::{ApiError, ApiResult};
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::thumbnail;
use axum::Json;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use darkroom_core::PLACEHOLDER_CLASSIFICATION;
use darkroom_core::artifact::{self, ImageVariant, MAX_NAME_ATTEMPTS};
use darkroom_metadata::models::{ImageRow, OwnedImageRow};
use darkroom_metadata::repos::{CameraRepo, ImageRepo, OwnershipRepo};
use darkroom_storage::{ObjectStore, StorageError};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

/// Image metadata returned by listings and uploads.
#[derive(Debug, Serialize)]
pub struct ImageSummary {
    pub id: Uuid,
    pub classification: String,
    pub captured_at: String,
    pub camera_name: Option<String>,
}

impl ImageSummary {
    fn from_owned_row(row: OwnedImageRow) -> ApiResult<Self> {
        Ok(Self {
            id: row.image_id,
            classification: row.classification,
            captured_at: format_timestamp(row.captured_at)?,
            camera_name: row.camera_name,
        })
    }
}

fn format_timestamp(ts: OffsetDateTime) -> ApiResult<String> {
    ts.format(&Rfc3339)
        .map_err(|e| ApiError::Internal(format!("failed to format timestamp: {e}")))
}

/// Image listing body.
#[derive(Debug, Serialize)]
pub struct ImageListResponse {
    pub images: Vec<ImageSummary>,
}

/// POST /images - Ingest an image from a paired device.
///
/// Pipeline: validate the multipart payload, claim a collision-free derived
/// name with the full artifact, write the thumbnail, and only then record the
/// metadata row. A row-insert failure leaves both artifacts orphaned but
/// harmless; nothing ever references a name that lost its claim.
#[tracing::instrument(skip(state, req))]
pub async fn upload_image(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<ImageSummary>)> {
    let camera_id = require_device(&req)?;

    // The token outlives nothing on its own: the camera row must still exist
    // and be paired for the upload to land anywhere meaningful.
    let camera = state
        .metadata
        .get_camera(camera_id)
        .await?
        .filter(|c| c.is_paired())
        .ok_or_else(|| ApiError::Unauthorized("unknown or unpaired device".to_string()))?;

    let data = read_image_part(req).await?;

    // Decoding doubles as validation: a payload that claims image/* but does
    // not decode is rejected before any artifact is written.
    let thumb = thumbnail::generate(data.clone()).await?;

    let captured_at = OffsetDateTime::now_utc();
    let file_name = store_full_artifact(&state, camera_id, captured_at, &data).await?;

    state
        .storage
        .put(&ImageVariant::Thumbnail.key(&file_name), thumb)
        .await?;

    let image = ImageRow {
        image_id: Uuid::new_v4(),
        camera_id,
        file_name: file_name.clone(),
        // TODO: run the classifier here once a model is wired in
        classification: PLACEHOLDER_CLASSIFICATION.to_string(),
        captured_at,
        created_at: captured_at,
    };

    if let Err(e) = state.metadata.create_image(&image).await {
        // Both artifacts are on disk with no row pointing at them:
        // unreachable but harmless, reclaimable by an orphan sweep.
        tracing::warn!(
            file_name = %file_name,
            error = %e,
            "image row insert failed after artifact writes"
        );
        return Err(ApiError::Internal(
            "failed to record image metadata".to_string(),
        ));
    }

    tracing::info!(image_id = %image.image_id, camera_id = %camera_id, "image ingested");

    Ok((
        StatusCode::CREATED,
        Json(ImageSummary {
            id: image.image_id,
            classification: image.classification,
            captured_at: format_timestamp(captured_at)?,
            camera_name: camera.name,
        }),
    ))
}

/// Pull the `image` part out of a multipart body.
async fn read_image_part(req: Request) -> ApiResult<Bytes> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field.content_type().map(str::to_string).unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(ApiError::BadRequest(format!(
                "expected an image media type, got \"{content_type}\""
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read image part: {e}")))?;
        if data.is_empty() {
            return Err(ApiError::BadRequest("image part is empty".to_string()));
        }
        return Ok(data);
    }

    Err(ApiError::BadRequest("no image provided".to_string()))
}

/// Write the original bytes under a collision-free derived name and return
/// the name.
///
/// Names are deterministic per (camera, second); a second upload within the
/// same second loses the conditional put and retries with the next
/// disambiguator. Exhausting every attempt is a storage failure, never an
/// overwrite.
async fn store_full_artifact(
    state: &AppState,
    camera_id: Uuid,
    captured_at: OffsetDateTime,
    data: &Bytes,
) -> ApiResult<String> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = artifact::derive_file_name(camera_id, captured_at, attempt)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        let claimed = state
            .storage
            .put_if_not_exists(&ImageVariant::Full.key(&candidate), data.clone())
            .await?;
        if claimed {
            return Ok(candidate);
        }

        tracing::debug!(candidate = %candidate, "artifact name taken, retrying");
    }

    Err(ApiError::Internal(format!(
        "no free artifact name for camera {camera_id}"
    )))
}

/// Render a listing as 204 (empty) or 200 with the summaries.
fn list_response(rows: Vec<OwnedImageRow>) -> ApiResult<Response> {
    if rows.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let images = rows
        .into_iter()
        .map(ImageSummary::from_owned_row)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(ImageListResponse { images }).into_response())
}

/// GET /images/data - List every image across the caller's cameras.
#[tracing::instrument(skip(state, req))]
pub async fn list_images(State(state): State<AppState>, req: Request) -> ApiResult<Response> {
    let user_id = require_user(&req)?;

    if state.metadata.count_cameras_for_user(user_id).await? == 0 {
        return Err(ApiError::NotFound("user has no paired cameras".to_string()));
    }

    let rows = state.metadata.images_for_user(user_id).await?;
    list_response(rows)
}

/// GET /cameras/{camera_id}/images/data - List one camera's images.
#[tracing::instrument(skip(state, req))]
pub async fn list_camera_images(
    State(state): State<AppState>,
    Path(camera_id): Path<Uuid>,
    req: Request,
) -> ApiResult<Response> {
    let user_id = require_user(&req)?;

    // Uniform 404: an absent camera and someone else's camera answer alike.
    if !state.metadata.owns_camera(user_id, camera_id).await? {
        return Err(ApiError::NotFound("camera not found".to_string()));
    }

    let rows = state.metadata.images_for_camera(camera_id).await?;
    list_response(rows)
}

/// GET /class/{classification}/images/data - List the caller's images with a
/// classification label.
#[tracing::instrument(skip(state, req))]
pub async fn list_class_images(
    State(state): State<AppState>,
    Path(classification): Path<String>,
    req: Request,
) -> ApiResult<Response> {
    let user_id = require_user(&req)?;

    if state.metadata.count_cameras_for_user(user_id).await? == 0 {
        return Err(ApiError::NotFound("user has no paired cameras".to_string()));
    }

    let rows = state
        .metadata
        .images_for_user_with_classification(user_id, &classification)
        .await?;
    list_response(rows)
}

/// GET /images/{image_id}/full - Stream the original artifact.
#[axum::debug_handler]
pub async fn fetch_full_image(
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
    req: Request,
) -> ApiResult<Response> {
    fetch_artifact(&state, &req, image_id, ImageVariant::Full).await
}

/// GET /images/{image_id}/thumbnail - Stream the thumbnail artifact.
pub async fn fetch_thumbnail_image(
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
    req: Request,
) -> ApiResult<Response> {
    fetch_artifact(&state, &req, image_id, ImageVariant::Thumbnail).await
}

#[tracing::instrument(skip(state, req))]
async fn fetch_artifact(
    state: &AppState,
    req: &Request,
    image_id: Uuid,
    variant: ImageVariant,
) -> ApiResult<Response> {
    let user_id = require_user(req)?;

    // Sole authorization path: the image resolves only through the caller's
    // ownership chain. Absent and not-owned are the same 404.
    let image = state
        .metadata
        .get_owned_image(user_id, image_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("image not found".to_string()))?;

    let key = variant.key(&image.file_name);
    let stream = state.storage.get_stream(&key).await.map_err(|e| match e {
        // An owned row whose artifact is gone is an integrity fault, not a
        // 404; surface it.
        StorageError::NotFound(_) => {
            ApiError::Internal(format!("artifact missing for recorded image {image_id}"))
        }
        other => ApiError::Storage(other),
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(format!("failed to build response: {e}")))
}

/// DELETE /images/{image_id} - Remove an image's artifacts and row.
///
/// Files first, then the row: a crash mid-way leaves a dangling row pointing
/// at already-gone files, which stays visible and deletable. The reverse
/// order would strand unreachable files that look like live data.
#[tracing::instrument(skip(state, req))]
pub async fn delete_image(
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
    req: Request,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = require_user(&req)?;

    let image = state
        .metadata
        .get_owned_image(user_id, image_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("image not found".to_string()))?;

    for variant in [ImageVariant::Full, ImageVariant::Thumbnail] {
        match state.storage.delete(&variant.key(&image.file_name)).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                // Dangling row from an earlier interrupted delete; removing
                // the row below is exactly the recovery.
                tracing::warn!(
                    image_id = %image_id,
                    variant = %variant,
                    "artifact already absent during delete"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    state.metadata.delete_image(image_id).await?;

    tracing::info!(image_id = %image_id, "image deleted");

    Ok(Json(MessageResponse {
        message: "image deleted".to_string(),
    }))
}
