//! routegate HTTP server binary

use anyhow::Context;
use routegate_core::reload::{ReloadResult, SettingsWatcher};
use routegate_core::{
    AccessEngine, FileSettingsStore, GateConfig, MemorySettingsStore, RouteDiscovery,
    SettingsService, SettingsStore, StaticRouteDiscovery,
};
use routegate_server::{build_router, AppState, HeaderAuthenticator};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

fn init_logging() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,routegate=debug"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Configuration file from `ROUTEGATE_CONFIG`, then environment overrides
fn load_config() -> anyhow::Result<GateConfig> {
    let mut config = match std::env::var("ROUTEGATE_CONFIG") {
        Ok(path) => GateConfig::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        Err(_) => {
            info!("ROUTEGATE_CONFIG not set, using default configuration");
            GateConfig::default()
        }
    };

    if let Ok(addr) = std::env::var("BIND_ADDRESS") {
        config.server.bind_address = addr;
    }
    if std::env::var("DEBUG").is_ok() {
        config.server.debug = true;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    info!("Starting routegate server v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    if config.server.admin_api_key == DEFAULT_ADMIN_KEY {
        warn!("Admin API key is the default placeholder; set server.admin_api_key");
    }

    // Initialize Prometheus metrics
    routegate_server::metrics::init_prometheus()?;
    routegate_server::metrics::init_metrics();

    // Engine and settings pipeline
    let engine = Arc::new(AccessEngine::new(config.normalizer()));
    let store: Arc<dyn SettingsStore> = match &config.settings.path {
        Some(path) => Arc::new(FileSettingsStore::new(path)),
        None => {
            info!("No settings file configured, public routes are kept in memory");
            Arc::new(MemorySettingsStore::new())
        }
    };
    let settings = Arc::new(SettingsService::with_key(
        engine.clone(),
        store,
        &config.gate.settings_key,
    ));
    settings
        .load_into_engine()
        .context("Failed to load public routes from settings")?;

    if let (Some(path), true) = (&config.settings.path, config.settings.watch) {
        SettingsWatcher::new(settings.clone(), path)
            .start()
            .context("Failed to watch settings file")?
            .drain_with(|event| match event.result {
                ReloadResult::Success(count) => {
                    routegate_server::metrics::record_settings_update(count)
                }
                ReloadResult::Failed(_) => {
                    routegate_server::metrics::record_error("settings_reload")
                }
            })
            .context("Failed to start settings reload thread")?;
    }

    let discovery: Arc<dyn RouteDiscovery> = match &config.server.route_manifest {
        Some(path) => Arc::new(
            StaticRouteDiscovery::from_file(path).context("Failed to load route manifest")?,
        ),
        None => Arc::new(StaticRouteDiscovery::default()),
    };

    let authenticator = Arc::new(HeaderAuthenticator::from_config(&config.auth));
    let state = AppState::new(
        settings,
        discovery,
        authenticator,
        &config.server.admin_api_key,
    )
    .with_debug(config.server.debug);

    let app = build_router(state)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address))?;

    info!(
        "Listening on {} (API root {})",
        addr,
        engine.normalizer().root_prefix()
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received shutdown signal, shutting down gracefully...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Server shutdown complete");
    Ok(())
}
