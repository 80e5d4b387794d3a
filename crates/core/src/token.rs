//! Bearer token issuance and verification.
//!
//! Two disjoint identity classes share the bearer-token mechanism: human
//! users (issued at login) and paired camera devices (issued at check_pair).
//! The subject kind travels inside the signed claims, so a token presented to
//! the wrong class of endpoint is rejected without consulting any store.

use crate::error::{Error, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// The class of principal a bearer token represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    /// A registered human account.
    User,
    /// A paired camera device.
    Device,
}

impl SubjectKind {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Device => "device",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signed claims carried by every bearer token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject id (user_id or camera_id).
    sub: Uuid,
    /// Explicit subject kind; user and device ids live in the same id space
    /// and are otherwise indistinguishable.
    kind: SubjectKind,
    /// Issued at (unix seconds).
    iat: i64,
    /// Expiry (unix seconds).
    exp: i64,
}

/// A verified token subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subject {
    pub subject_id: Uuid,
    pub kind: SubjectKind,
}

/// Issues and verifies signed, time-bounded bearer tokens.
///
/// Verification is stateless; the signing secret is process-wide
/// configuration loaded once at startup. Tokens are opaque to callers.
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenAuthority {
    /// Create a token authority from the signing secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Issue a token binding `(subject_id, kind)`, valid for `ttl`.
    pub fn issue(&self, subject_id: Uuid, kind: SubjectKind, ttl: Duration) -> Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: subject_id,
            kind,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::TokenMalformed(e.to_string()))
    }

    /// Verify a token and return its subject.
    pub fn verify(&self, token: &str) -> Result<Subject> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Error::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => Error::TokenSignature,
                _ => Error::TokenMalformed(e.to_string()),
            }
        })?;

        Ok(Subject {
            subject_id: data.claims.sub,
            kind: data.claims.kind,
        })
    }
}
