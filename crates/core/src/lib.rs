//! Core domain types and shared logic for the Darkroom camera image server.
//!
//! This crate defines the canonical model used across all other crates:
//! - Subject-kind bearer tokens (user vs device identities)
//! - Normalized email addresses
//! - Image artifact variants and storage naming
//! - Shared configuration types

pub mod artifact;
pub mod config;
pub mod email;
pub mod error;
pub mod token;

pub use artifact::{ImageVariant, derive_file_name};
pub use email::EmailAddress;
pub use error::{Error, Result};
pub use token::{Subject, SubjectKind, TokenAuthority};

/// Longest edge of a generated thumbnail, in pixels.
pub const THUMBNAIL_MAX_DIM: u32 = 128;

/// Classification recorded for every ingested image until a real classifier
/// is wired in.
pub const PLACEHOLDER_CLASSIFICATION: &str = "placeholder";
