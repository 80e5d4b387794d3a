//! Health check endpoint.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use darkroom_metadata::MetadataStore;
use darkroom_storage::ObjectStore;
use serde::Serialize;

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health - Verify storage and metadata connectivity.
///
/// Intentionally unauthenticated, for load balancer and orchestrator probes.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.storage.health_check().await?;
    state.metadata.health_check().await?;

    Ok(Json(HealthResponse { status: "ok" }))
}
