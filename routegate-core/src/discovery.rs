//! Route discovery feed
//!
//! Discovery only feeds the admin catalog. The decision path never consults
//! it, so an unavailable feed cannot change who gets in.

use crate::error::{Result, RouteGateError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Namespace assigned to routes without two leading segments
pub const FALLBACK_NAMESPACE: &str = "other";

/// One registered API route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Path pattern relative to the API root, e.g. `/wp/v2/posts/(?P<id>[\d]+)`
    pub route: String,
    /// Supported HTTP methods
    #[serde(default)]
    pub methods: BTreeSet<String>,
}

impl RouteDescriptor {
    /// Create a descriptor; method names are upper-cased
    pub fn new<I, S>(route: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RouteDescriptor {
            route: route.into(),
            methods: methods
                .into_iter()
                .map(|m| m.as_ref().trim().to_ascii_uppercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Internal routes (`/__...`) are never listed
    pub fn is_internal(&self) -> bool {
        self.route.starts_with("/__")
    }
}

/// Source of the currently registered API surface
pub trait RouteDiscovery: Send + Sync {
    /// All registered routes
    fn routes(&self) -> Result<Vec<RouteDescriptor>>;
}

/// Discovery backed by a fixed route list
#[derive(Debug, Clone, Default)]
pub struct StaticRouteDiscovery {
    routes: Vec<RouteDescriptor>,
}

impl StaticRouteDiscovery {
    /// Create from descriptors
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        StaticRouteDiscovery { routes }
    }

    /// Load a JSON array of descriptors
    pub fn from_json(json: &str) -> Result<Self> {
        let routes: Vec<RouteDescriptor> = serde_json::from_str(json)
            .map_err(|e| RouteGateError::DiscoveryError(format!("Invalid route list: {}", e)))?;
        Ok(Self::new(routes))
    }

    /// Load a JSON array of descriptors from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RouteGateError::DiscoveryError(format!("Failed to read {:?}: {}", path, e))
        })?;
        Self::from_json(&content)
    }
}

impl RouteDiscovery for StaticRouteDiscovery {
    fn routes(&self) -> Result<Vec<RouteDescriptor>> {
        Ok(self.routes.clone())
    }
}

/// Namespace of a route: its first two path segments.
///
/// `/wp/v2/posts/(?P<id>\d+)` → `wp/v2`. Routes with fewer than two
/// non-empty leading segments fall back to [`FALLBACK_NAMESPACE`].
pub fn namespace_of(route: &str) -> &str {
    let Some(body) = route.strip_prefix('/') else {
        return FALLBACK_NAMESPACE;
    };

    // First segment is at least one byte; the namespace ends at the first
    // following separator whose next segment is non-empty.
    for (idx, ch) in body.char_indices().skip(1) {
        if ch != '/' {
            continue;
        }
        let next = &body[idx + 1..];
        let segment_len = next.find('/').unwrap_or(next.len());
        if segment_len > 0 {
            return &body[..idx + 1 + segment_len];
        }
    }

    FALLBACK_NAMESPACE
}

/// Group visible routes by namespace
pub fn group_by_namespace(routes: Vec<RouteDescriptor>) -> BTreeMap<String, Vec<RouteDescriptor>> {
    let mut grouped: BTreeMap<String, Vec<RouteDescriptor>> = BTreeMap::new();

    for descriptor in routes.into_iter().filter(|d| !d.is_internal()) {
        grouped
            .entry(namespace_of(&descriptor.route).to_string())
            .or_default()
            .push(descriptor);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_of() {
        assert_eq!(namespace_of("/wp/v2/posts"), "wp/v2");
        assert_eq!(namespace_of("/wp/v2"), "wp/v2");
        assert_eq!(namespace_of("/oembed/1.0/embed"), "oembed/1.0");
        assert_eq!(namespace_of("/custom/v1/public/(?P<id>\\d+)"), "custom/v1");
    }

    #[test]
    fn test_namespace_fallback() {
        assert_eq!(namespace_of("/"), FALLBACK_NAMESPACE);
        assert_eq!(namespace_of("/batch"), FALLBACK_NAMESPACE);
        assert_eq!(namespace_of("/wp/"), FALLBACK_NAMESPACE);
        assert_eq!(namespace_of("wp/v2"), FALLBACK_NAMESPACE);
        assert_eq!(namespace_of(""), FALLBACK_NAMESPACE);
    }

    #[test]
    fn test_namespace_skips_empty_segments() {
        assert_eq!(namespace_of("/a//b/c"), "a//b");
    }

    #[test]
    fn test_group_by_namespace_hides_internal() {
        let grouped = group_by_namespace(vec![
            RouteDescriptor::new("/wp/v2/posts", ["GET", "POST"]),
            RouteDescriptor::new("/wp/v2/pages", ["get"]),
            RouteDescriptor::new("/__internal/v1/ping", ["GET"]),
            RouteDescriptor::new("/", ["GET"]),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["wp/v2"].len(), 2);
        assert_eq!(grouped[FALLBACK_NAMESPACE][0].route, "/");
        assert!(grouped["wp/v2"][1].methods.contains("GET"));
    }

    #[test]
    fn test_static_discovery_from_json() {
        let discovery = StaticRouteDiscovery::from_json(
            r#"[{"route": "/wp/v2/posts", "methods": ["GET"]}, {"route": "/wp/v2/users"}]"#,
        )
        .unwrap();
        let routes = discovery.routes().unwrap();
        assert_eq!(routes.len(), 2);
        assert!(routes[1].methods.is_empty());
    }

    #[test]
    fn test_static_discovery_rejects_garbage() {
        assert!(matches!(
            StaticRouteDiscovery::from_json("{"),
            Err(RouteGateError::DiscoveryError(_))
        ));
    }
}
