//! API request and response types

use routegate_core::{AccessDecision, PublicRouteSet, SettingsValue};
use serde::{Deserialize, Serialize};

/// Dry-run decision request
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequest {
    /// Request path as the client would send it
    pub path: String,

    /// Treat the caller as already authenticated
    #[serde(default)]
    pub authenticated: bool,
}

/// Dry-run decision response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideResponse {
    /// The decision the gate would make
    pub decision: AccessDecision,

    /// Path after canonicalization
    pub canonical_path: String,

    /// Diagnostic information (only in debug mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

/// Diagnostic information for debugging
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Time taken to decide (milliseconds)
    pub evaluation_time_ms: f64,

    /// Public routes in the snapshot used
    pub public_routes: usize,
}

/// Stored public routes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    /// Settings key the routes are stored under
    pub key: String,

    /// Canonical public routes in order
    pub routes: Vec<String>,

    /// Same routes as a comma-joined form field
    pub form_field: String,
}

impl SettingsResponse {
    /// Build from a published set
    pub fn new(key: &str, routes: &PublicRouteSet) -> Self {
        SettingsResponse {
            key: key.to_string(),
            routes: routes.entries().to_vec(),
            form_field: routes.to_form_field(),
        }
    }
}

/// Admin submission of the public route list
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSettingsRequest {
    /// Comma-joined string or list of routes
    pub routes: SettingsValue,
}

/// Echo returned by the protected API surface
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoResponse {
    /// Request method
    pub method: String,

    /// Request path
    pub path: String,

    /// Decision that let the request through
    pub decision: AccessDecision,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status
    pub status: HealthStatus,

    /// Service version
    pub version: String,

    /// Uptime in seconds
    pub uptime_seconds: u64,

    /// Number of public routes currently published
    pub public_routes: usize,
}

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is healthy
    Healthy,
    /// Service is degraded but functional
    Degraded,
}
