//! Account registration, login, and token validation.

use crate::auth::get_subject;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{MessageResponse, read_json_body};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use darkroom_core::{EmailAddress, SubjectKind};
use darkroom_metadata::models::UserRow;
use darkroom_metadata::repos::UserRepo;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Maximum request body size for account endpoints (64 KiB).
const MAX_ACCOUNT_BODY_SIZE: usize = 64 * 1024;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Token validation response.
#[derive(Debug, Serialize)]
pub struct ValidateTokenResponse {
    pub authorized: bool,
}

/// Hash a password on a blocking thread; bcrypt is deliberately slow.
async fn hash_password(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// Verify a password attempt against a stored digest, on a blocking thread.
async fn verify_password(digest: String, attempt: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(attempt, &digest))
        .await
        .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("failed to verify password: {e}")))
}

/// POST /register - Create a user account.
#[tracing::instrument(skip(state, req))]
pub async fn register(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let body: RegisterRequest = read_json_body(req, MAX_ACCOUNT_BODY_SIZE).await?;

    let first_name = body
        .first_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("first name and last name are required".to_string()))?;
    let last_name = body
        .last_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("first name and last name are required".to_string()))?;

    let raw_email = body
        .email
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("email and password are required".to_string()))?;
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("email and password are required".to_string()))?;

    // The one place email normalization happens for registration; login goes
    // through the same parse, so the two can never disagree.
    let email = EmailAddress::parse(raw_email)?;

    let password_hash = hash_password(password).await?;

    let user = UserRow {
        user_id: Uuid::new_v4(),
        email: email.into_string(),
        password_hash,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        created_at: OffsetDateTime::now_utc(),
    };

    state.metadata.create_user(&user).await.map_err(|e| match e {
        darkroom_metadata::MetadataError::AlreadyExists(_) => {
            ApiError::Conflict("email is already in use".to_string())
        }
        other => other.into(),
    })?;

    tracing::info!(user_id = %user.user_id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "user created".to_string(),
        }),
    ))
}

/// POST /login - Exchange credentials for a user-kind bearer token.
#[tracing::instrument(skip(state, req))]
pub async fn login(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<LoginResponse>> {
    let body: LoginRequest = read_json_body(req, MAX_ACCOUNT_BODY_SIZE).await?;

    let raw_email = body
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("email and password are required".to_string()))?;
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("email and password are required".to_string()))?;

    let email = EmailAddress::parse(raw_email)?;

    // Uniform failure message: whether the account is missing or the
    // password is wrong is not observable.
    let user = state
        .metadata
        .get_user_by_email(email.as_str())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid email or password".to_string()))?;

    if !verify_password(user.password_hash.clone(), password).await? {
        return Err(ApiError::Unauthorized(
            "invalid email or password".to_string(),
        ));
    }

    let access_token = state.tokens.issue(
        user.user_id,
        SubjectKind::User,
        state.config.auth.user_token_ttl(),
    )?;

    Ok(Json(LoginResponse { access_token }))
}

/// POST /validate_token - Report whether the presented token is a live
/// user-kind token.
///
/// Returns 404 rather than 401 for anything else; this endpoint exists for
/// client session probes and deliberately mirrors the unified not-found
/// shape.
pub async fn validate_token(req: Request) -> (StatusCode, Json<ValidateTokenResponse>) {
    match get_subject(&req) {
        Some(auth) if auth.subject.kind == SubjectKind::User => {
            (StatusCode::OK, Json(ValidateTokenResponse { authorized: true }))
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(ValidateTokenResponse { authorized: false }),
        ),
    }
}
