//! Device pairing endpoints.

use crate::auth::require_user;
use crate::error::{ApiError, ApiResult};
use crate::handlers::read_json_body;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use darkroom_core::SubjectKind;
use darkroom_metadata::repos::CameraRepo;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Maximum request body size for pairing requests (64 KiB).
const MAX_PAIR_BODY_SIZE: usize = 64 * 1024;

/// Pairing request body.
#[derive(Debug, Deserialize)]
pub struct PairRequest {
    /// The device's pairing token.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Paired camera summary.
#[derive(Debug, Serialize)]
pub struct CameraResponse {
    pub camera_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Device token response for check_pair.
#[derive(Debug, Serialize)]
pub struct CheckPairResponse {
    pub access_token: String,
}

/// POST /cameras - Pair a provisioned camera to the calling user.
///
/// The transition is a storage-layer compare-and-set: under concurrent
/// attempts for the same pairing token exactly one caller wins, and every
/// loser gets the same invalid-or-already-paired answer as an unknown token.
#[tracing::instrument(skip(state, req))]
pub async fn pair_camera(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<CameraResponse>)> {
    let user_id = require_user(&req)?;
    let body: PairRequest = read_json_body(req, MAX_PAIR_BODY_SIZE).await?;

    let token = body
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("device token is required".to_string()))?;
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("camera name is required".to_string()))?;
    let description = body.description.as_deref().unwrap_or("").trim();

    let claimed = state
        .metadata
        .claim_camera(token, user_id, name, description, OffsetDateTime::now_utc())
        .await?;

    if !claimed {
        return Err(ApiError::Conflict(
            "invalid device token or camera is already paired".to_string(),
        ));
    }

    let camera = state
        .metadata
        .get_camera_by_pairing_token(token)
        .await?
        .ok_or_else(|| ApiError::Internal("paired camera not found after claim".to_string()))?;

    tracing::info!(camera_id = %camera.camera_id, user_id = %user_id, "camera paired");

    Ok((
        StatusCode::CREATED,
        Json(CameraResponse {
            camera_id: camera.camera_id,
            name: camera.name,
            description: camera.description,
        }),
    ))
}

/// GET /cameras/{pairing_token}/check_pair - Poll pairing state and mint a
/// device token.
///
/// Callable without a bearer token: before pairing completes the device holds
/// nothing but its pairing token. Idempotent after pairing; every call mints
/// a fresh device-kind token.
#[tracing::instrument(skip(state, pairing_token))]
pub async fn check_pair(
    State(state): State<AppState>,
    Path(pairing_token): Path<String>,
) -> ApiResult<(StatusCode, Json<CheckPairResponse>)> {
    let camera = state
        .metadata
        .get_camera_by_pairing_token(&pairing_token)
        .await?;

    match camera {
        Some(camera) if camera.is_paired() => {
            let access_token = state.tokens.issue(
                camera.camera_id,
                SubjectKind::Device,
                state.config.auth.device_token_ttl(),
            )?;

            Ok((
                StatusCode::CREATED,
                Json(CheckPairResponse { access_token }),
            ))
        }
        // Unknown token and not-yet-paired are deliberately the same answer.
        _ => Err(ApiError::BadRequest(
            "invalid device token or camera is not paired".to_string(),
        )),
    }
}
