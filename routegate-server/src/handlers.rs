//! HTTP request handlers

use crate::api::{
    DecideRequest, DecideResponse, Diagnostics, EchoResponse, HealthResponse, HealthStatus,
    SettingsResponse, UpdateSettingsRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{Method, Uri},
    Extension, Json,
};
use routegate_core::{AccessDecision, RouteCatalog};
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Query parameters for debug mode
#[derive(Debug, Deserialize)]
pub struct DebugParams {
    #[serde(default)]
    debug: bool,
}

/// Query parameters for the admin route catalog
#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    /// Fuzzy search term
    #[serde(default)]
    search: Option<String>,
}

/// Dry-run a decision without touching the protected API
pub async fn decide(
    State(state): State<AppState>,
    Query(params): Query<DebugParams>,
    Json(req): Json<DecideRequest>,
) -> ApiResult<Json<DecideResponse>> {
    let start = Instant::now();

    debug!("Decide request: {:?}", req);

    let decision = state.engine.decide(&req.path, req.authenticated);
    let canonical_path = state.engine.normalizer().canonicalize_path(&req.path);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let mut response = DecideResponse {
        decision,
        canonical_path,
        diagnostics: None,
    };

    if state.debug || params.debug {
        response.diagnostics = Some(Diagnostics {
            evaluation_time_ms: elapsed_ms,
            public_routes: state.engine.snapshot().len(),
        });
    }

    info!(
        "Decide: {} (authenticated: {}) -> allowed: {} ({:.3}ms)",
        req.path,
        req.authenticated,
        response.decision.is_allowed(),
        elapsed_ms
    );

    Ok(Json(response))
}

/// Current public route settings
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    let routes = state.settings.current();
    Json(SettingsResponse::new(state.settings.key(), &routes))
}

/// Replace the public route list
pub async fn update_settings(
    State(state): State<AppState>,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    let settings = state.settings.clone();

    // Persistence touches the filesystem
    let routes = tokio::task::spawn_blocking(move || settings.save(req.routes))
        .await
        .map_err(|e| ApiError::Internal(format!("Settings task failed: {}", e)))?
        .map_err(|e| {
            error!("Failed to save settings: {}", e);
            metrics::record_error("settings_save");
            ApiError::from(e)
        })?;

    metrics::record_settings_update(routes.len());
    info!(public_routes = routes.len(), "Public routes updated by admin");

    Ok(Json(SettingsResponse::new(state.settings.key(), &routes)))
}

/// Admin catalog of registered routes with their public flags
pub async fn route_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> ApiResult<Json<RouteCatalog>> {
    let routes = state.discovery.routes().map_err(|e| {
        warn!("Route discovery failed: {}", e);
        metrics::record_error("discovery");
        ApiError::from(e)
    })?;

    let catalog = RouteCatalog::build(
        state.engine.normalizer(),
        routes,
        &state.settings.current(),
        params.search.as_deref(),
    );

    debug!(endpoints = catalog.endpoint_count(), "Route catalog built");
    Ok(Json(catalog))
}

/// Protected API surface; reached only through the gate
pub async fn api_echo(
    Extension(decision): Extension<AccessDecision>,
    method: Method,
    uri: Uri,
) -> Json<EchoResponse> {
    Json(EchoResponse {
        method: method.to_string(),
        path: uri.path().to_string(),
        decision,
    })
}

fn health(state: &AppState) -> HealthResponse {
    HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        public_routes: state.engine.snapshot().len(),
    }
}

/// Health check - liveness probe
pub async fn health_live(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health(&state))
}

/// Health check - readiness probe
pub async fn health_ready(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    // The settings store must be readable for admin saves and reloads
    let settings = state.settings.clone();
    tokio::task::spawn_blocking(move || settings.check_store())
        .await
        .map_err(|e| ApiError::Internal(format!("Health check failed: {}", e)))?
        .map_err(|e| {
            warn!("Readiness check failed: {}", e);
            ApiError::ServiceUnavailable("Settings store not readable".to_string())
        })?;

    let mut response = health(&state);
    if let Err(e) = state.discovery.routes() {
        warn!("Route discovery unavailable: {}", e);
        response.status = HealthStatus::Degraded;
    }

    Ok(Json(response))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> String {
    metrics::update_engine_metrics(
        state.engine.snapshot().len(),
        &state.engine.metrics().snapshot(),
    );
    metrics::get_prometheus_metrics()
}
