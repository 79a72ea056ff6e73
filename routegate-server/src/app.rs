//! Router assembly

use crate::auth::{admin_auth_middleware, gate_middleware};
use crate::handlers;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};

/// Build the application router.
///
/// Three surfaces share one state:
/// - the protected API under the root prefix, behind the route gate
/// - `/admin/*`, behind the admin key
/// - service endpoints (`/v1/decide`, health, metrics), open
pub fn build_router(state: AppState) -> Router {
    let root = state.engine.normalizer().root_prefix().to_string();
    let base = root.trim_end_matches('/');

    let mut api = Router::new();
    if !base.is_empty() {
        api = api.route(base, any(handlers::api_echo));
    }
    let api = api
        .route(&root, any(handlers::api_echo))
        .route(&format!("{}/*rest", base), any(handlers::api_echo))
        .route_layer(middleware::from_fn_with_state(state.clone(), gate_middleware));

    let admin = Router::new()
        .route(
            "/admin/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/admin/routes", get(handlers::route_catalog))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/v1/decide", post(handlers::decide))
        .route("/health/live", get(handlers::health_live))
        .route("/health/ready", get(handlers::health_ready))
        .route("/metrics", get(handlers::metrics))
        .merge(admin)
        .merge(api)
        .with_state(state)
}
