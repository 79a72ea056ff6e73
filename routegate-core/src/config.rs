//! Configuration schema and loading
//!
//! ```toml
//! [gate]
//! root_prefix = "/wp-json/"
//! settings_key = "public_endpoints"
//!
//! [settings]
//! path = "/var/lib/routegate/settings.json"
//! watch = true
//!
//! [auth]
//! bearer_tokens = ["..."]
//! session_cookie = "wordpress_logged_in"
//!
//! [server]
//! bind_address = "0.0.0.0:8080"
//! admin_api_key = "..."
//! route_manifest = "/etc/routegate/routes.json"
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use crate::error::{Result, RouteGateError};
use crate::normalize::{RouteNormalizer, DEFAULT_ROOT_PREFIX};
use crate::settings::PUBLIC_ROUTES_KEY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Route matching settings
    pub gate: GateSection,
    /// Settings persistence
    pub settings: SettingsSection,
    /// Authentication detection
    pub auth: AuthSection,
    /// HTTP server
    pub server: ServerSection,
}

/// Route matching settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GateSection {
    /// API mount point every route is canonicalized against
    pub root_prefix: String,
    /// Settings key the public route list is stored under
    pub settings_key: String,
}

impl Default for GateSection {
    fn default() -> Self {
        GateSection {
            root_prefix: DEFAULT_ROOT_PREFIX.to_string(),
            settings_key: PUBLIC_ROUTES_KEY.to_string(),
        }
    }
}

/// Settings persistence
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsSection {
    /// JSON settings file; in-memory settings when absent
    pub path: Option<PathBuf>,
    /// Reload the file when it changes on disk
    pub watch: bool,
}

/// Authentication detection
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthSection {
    /// Bearer tokens that mark a request as authenticated
    pub bearer_tokens: Vec<String>,
    /// Cookie whose presence marks a logged-in session
    pub session_cookie: Option<String>,
}

/// HTTP server
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSection {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,
    /// Bearer key for the admin endpoints
    pub admin_api_key: String,
    /// Include decision details in responses
    pub debug: bool,
    /// JSON list of registered routes shown in the admin catalog
    pub route_manifest: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        ServerSection {
            bind_address: "0.0.0.0:8080".to_string(),
            // WARNING: placeholder, override in production
            admin_api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            debug: false,
            route_manifest: None,
        }
    }
}

impl GateConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Normalizer for the configured root prefix
    pub fn normalizer(&self) -> RouteNormalizer {
        RouteNormalizer::new(&self.gate.root_prefix)
    }

    /// Semantic checks; serde already handled syntax.
    ///
    /// Collects every problem instead of stopping at the first.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        let prefix = &self.gate.root_prefix;
        if prefix.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
            problems.push(format!(
                "gate.root_prefix {:?} must be a plain path without whitespace, query or fragment",
                prefix
            ));
        }
        if self.gate.settings_key.trim().is_empty() {
            problems.push("gate.settings_key must not be empty".to_string());
        }
        if self.server.admin_api_key.trim().is_empty() {
            problems.push("server.admin_api_key must not be empty".to_string());
        }
        if self.auth.bearer_tokens.iter().any(|t| t.trim().is_empty()) {
            problems.push("auth.bearer_tokens must not contain empty tokens".to_string());
        }
        if let Some(cookie) = &self.auth.session_cookie {
            if cookie.trim().is_empty() {
                problems.push("auth.session_cookie must not be empty when set".to_string());
            }
        }
        if self.settings.watch && self.settings.path.is_none() {
            problems.push("settings.watch requires settings.path".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RouteGateError::ConfigError(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = GateConfig::from_toml("").unwrap();
        assert_eq!(config, GateConfig::default());
        assert_eq!(config.normalizer().root_prefix(), "/wp-json/");
        assert_eq!(config.gate.settings_key, "public_endpoints");
        assert!(config.settings.path.is_none());
    }

    #[test]
    fn test_full_document() {
        let config = GateConfig::from_toml(
            r#"
            [gate]
            root_prefix = "api"

            [settings]
            path = "/tmp/settings.json"
            watch = true

            [auth]
            bearer_tokens = ["secret"]
            session_cookie = "session"

            [server]
            bind_address = "127.0.0.1:9000"
            admin_api_key = "admin"
            route_manifest = "routes.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.normalizer().root_prefix(), "/api/");
        assert_eq!(config.settings.path, Some(PathBuf::from("/tmp/settings.json")));
        assert_eq!(config.auth.bearer_tokens, vec!["secret"]);
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.server.route_manifest, Some(PathBuf::from("routes.json")));
    }

    #[test]
    fn test_validation_collects_all_problems() {
        let err = GateConfig::from_toml(
            r#"
            [gate]
            root_prefix = "/wp json/"
            settings_key = ""

            [settings]
            watch = true
            "#,
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("root_prefix"));
        assert!(msg.contains("settings_key"));
        assert!(msg.contains("settings.watch"));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            GateConfig::from_toml("[gate"),
            Err(RouteGateError::ConfigParse(_))
        ));
    }
}
