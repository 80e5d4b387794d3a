//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.server.max_upload_bytes;

    Router::new()
        // Health check (intentionally unauthenticated for probes)
        .route("/health", get(handlers::health_check))
        // Accounts
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/validate_token", post(handlers::validate_token))
        // Pairing. The {camera} segment is a pairing token for check_pair and
        // a camera id for the listing; the router needs one name for both.
        .route("/cameras", post(handlers::pair_camera))
        .route("/cameras/{camera}/check_pair", get(handlers::check_pair))
        .route(
            "/cameras/{camera}/images/data",
            get(handlers::list_camera_images),
        )
        // Images
        .route("/images", post(handlers::upload_image))
        .route("/images/data", get(handlers::list_images))
        .route("/images/{image_id}/full", get(handlers::fetch_full_image))
        .route(
            "/images/{image_id}/thumbnail",
            get(handlers::fetch_thumbnail_image),
        )
        .route("/images/{image_id}", delete(handlers::delete_image))
        .route(
            "/class/{classification}/images/data",
            get(handlers::list_class_images),
        )
        // Middleware layers are applied in reverse order (outermost first):
        // TraceLayer -> Auth -> Handler
        .layer(DefaultBodyLimit::max(max_body))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
