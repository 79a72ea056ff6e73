//! routegate core - public route bypass decisions for HTTP APIs
//!
//! This crate decides whether an unauthenticated request may reach an API
//! route without logging in. Administrators configure a list of public route
//! prefixes; every other route keeps requiring authentication.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod reload;
pub mod routes;
pub mod settings;

pub use catalog::RouteCatalog;
pub use config::GateConfig;
pub use discovery::{RouteDescriptor, RouteDiscovery, StaticRouteDiscovery};
pub use engine::{decide, AccessDecision, AccessDenied, AccessEngine, Grant};
pub use error::{Result, RouteGateError};
pub use normalize::RouteNormalizer;
pub use routes::{split_form_field, PublicRouteSet};
pub use settings::{
    FileSettingsStore, MemorySettingsStore, SettingsService, SettingsStore, SettingsValue,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }
}
