//! Error types for routegate

use thiserror::Error;

/// Main error type for routegate operations
///
/// None of these variants surface from [`crate::engine::AccessEngine::decide`];
/// the decision path is infallible and reports denials as values.
#[derive(Error, Debug)]
pub enum RouteGateError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Settings store error
    #[error("Settings error: {0}")]
    SettingsError(String),

    /// Route discovery feed unavailable or malformed
    #[error("Discovery error: {0}")]
    DiscoveryError(String),

    /// File watcher error
    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type alias for routegate operations
pub type Result<T> = std::result::Result<T, RouteGateError>;
