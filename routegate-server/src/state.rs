//! Application state

use crate::auth::Authenticator;
use routegate_core::{AccessEngine, RouteDiscovery, SettingsService};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The access decision engine
    pub engine: Arc<AccessEngine>,

    /// Settings pipeline publishing to `engine`
    pub settings: Arc<SettingsService>,

    /// Registered routes for the admin catalog
    pub discovery: Arc<dyn RouteDiscovery>,

    /// Authentication hook used by the gate
    pub authenticator: Arc<dyn Authenticator>,

    /// Bearer key for `/admin/*`
    pub admin_api_key: Arc<str>,

    /// Server start time
    pub start_time: Instant,

    /// Debug mode flag
    pub debug: bool,
}

impl AppState {
    /// Create new application state
    pub fn new(
        settings: Arc<SettingsService>,
        discovery: Arc<dyn RouteDiscovery>,
        authenticator: Arc<dyn Authenticator>,
        admin_api_key: &str,
    ) -> Self {
        Self {
            engine: settings.engine().clone(),
            settings,
            discovery,
            authenticator,
            admin_api_key: Arc::from(admin_api_key),
            start_time: Instant::now(),
            debug: false,
        }
    }

    /// Enable or disable debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
