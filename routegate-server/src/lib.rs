//! routegate HTTP server - route gate in front of an HTTP API
//!
//! This crate hosts the access engine as axum middleware, exposes admin
//! endpoints for editing the public route list and a dry-run decision API.

pub mod api;
pub mod app;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

pub use api::{DecideRequest, DecideResponse, HealthResponse, SettingsResponse};
pub use app::build_router;
pub use auth::{Authenticator, HeaderAuthenticator};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
