//! Authentication middleware and subject-kind guards.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use darkroom_core::{Subject, SubjectKind};
use tracing::Instrument;
use uuid::Uuid;

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value.
    ///
    /// The value is truncated to MAX_TRACE_ID_LEN characters and filtered to
    /// printable ASCII; an empty result falls back to a generated ID.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated request extension carrying the verified token subject.
#[derive(Clone, Copy, Debug)]
pub struct AuthenticatedSubject {
    pub subject: Subject,
}

/// Extract bearer token from Authorization header.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
fn extract_bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(&v[7..])
            } else {
                None
            }
        })
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Authentication middleware: verifies any presented bearer token and sets up
/// trace context.
///
/// A missing, expired, or otherwise invalid token leaves the request
/// unauthenticated (and logged); protected handlers fail closed through the
/// `require_*` guards below.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = extract_or_generate_trace_id(&req);
    let trace_id_str = trace_id.0.clone();
    req.extensions_mut().insert(trace_id);

    if let Some(token_str) = extract_bearer_token(&req) {
        match state.tokens.verify(token_str) {
            Ok(subject) => {
                req.extensions_mut().insert(AuthenticatedSubject { subject });
            }
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
            }
        }
    }

    let response = next
        .run(req)
        .instrument(tracing::info_span!("request", trace_id = %trace_id_str))
        .await;

    Ok(response)
}

/// Get optional authentication.
pub fn get_subject(req: &Request) -> Option<&AuthenticatedSubject> {
    req.extensions().get::<AuthenticatedSubject>()
}

/// Require a user-kind token and return the user id.
///
/// The subject kind is checked explicitly, never inferred: a device token
/// presented here is rejected even though device and user ids share an id
/// space.
pub fn require_user(req: &Request) -> ApiResult<Uuid> {
    require_kind(req, SubjectKind::User)
}

/// Require a device-kind token and return the camera id.
pub fn require_device(req: &Request) -> ApiResult<Uuid> {
    require_kind(req, SubjectKind::Device)
}

fn require_kind(req: &Request, kind: SubjectKind) -> ApiResult<Uuid> {
    let auth = get_subject(req)
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))?;

    if auth.subject.kind != kind {
        return Err(ApiError::Unauthorized(format!(
            "{kind} token required, got {} token",
            auth.subject.kind
        )));
    }

    Ok(auth.subject.subject_id)
}
