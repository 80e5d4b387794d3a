//! HTTP API server for the Darkroom camera image service.
//!
//! This crate provides the HTTP control plane:
//! - Account registration and login
//! - Device pairing and device token minting
//! - Image ingestion (full + thumbnail artifacts)
//! - Ownership-scoped image listing, streaming, and deletion

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod thumbnail;

pub use auth::TraceId;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
