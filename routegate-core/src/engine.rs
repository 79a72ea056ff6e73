//! Access decision engine
//!
//! The engine answers one question per inbound request: may this caller
//! reach this path without authenticating? Authenticated callers always
//! pass. Unauthenticated callers pass only when the canonical request path
//! starts with one of the configured public route prefixes.
//!
//! Matching is a byte-wise *prefix* test, so a public `/wp-json/wp/v2/posts`
//! also exposes `/wp-json/wp/v2/posts/123` and `/wp-json/wp/v2/posts-extra`.

use crate::normalize::RouteNormalizer;
use crate::routes::PublicRouteSet;
use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// HTTP status attached to every denial
pub const DENY_STATUS: u16 = 401;

/// Machine-readable denial code
pub const DENY_CODE: &str = "rest_forbidden";

/// Human-readable denial message
pub const DENY_MESSAGE: &str = "You are not authorized to access this resource.";

/// Error descriptor carried by a denial
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct AccessDenied {
    /// HTTP status (always 401)
    pub status: u16,
    /// Stable machine code
    pub code: &'static str,
    /// Message shown to the client
    pub message: &'static str,
}

impl AccessDenied {
    /// The single denial this engine produces
    pub const fn unauthorized() -> Self {
        AccessDenied {
            status: DENY_STATUS,
            code: DENY_CODE,
            message: DENY_MESSAGE,
        }
    }
}

/// Why a request was allowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Grant {
    /// Caller is already authenticated
    Authenticated,
    /// Path matched a configured public prefix
    PublicRoute {
        /// The matching canonical entry
        prefix: String,
    },
}

/// Outcome of a single access check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Request may proceed
    Allow(Grant),
    /// Request must be rejected with the carried error
    Deny(AccessDenied),
}

impl AccessDecision {
    /// Check if the decision lets the request through
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow(_))
    }

    /// Denial descriptor, if any
    pub fn denial(&self) -> Option<&AccessDenied> {
        match self {
            AccessDecision::Deny(denied) => Some(denied),
            AccessDecision::Allow(_) => None,
        }
    }
}

/// Decide access for one request against an explicit route snapshot.
///
/// `routes` must have been built with the same `normalizer`.
pub fn decide(
    normalizer: &RouteNormalizer,
    path: &str,
    authenticated: bool,
    routes: &PublicRouteSet,
) -> AccessDecision {
    if authenticated {
        return AccessDecision::Allow(Grant::Authenticated);
    }

    // Fail closed: no configuration means nothing is public
    if routes.is_empty() {
        return AccessDecision::Deny(AccessDenied::unauthorized());
    }

    let canonical = normalizer.canonicalize_path(path);
    match routes.matching_prefix(&canonical) {
        Some(prefix) => AccessDecision::Allow(Grant::PublicRoute {
            prefix: prefix.to_string(),
        }),
        None => AccessDecision::Deny(AccessDenied::unauthorized()),
    }
}

/// Engine holding the current public route snapshot
///
/// Readers load the snapshot without locking; writers build a complete
/// [`PublicRouteSet`] and publish it with a single pointer swap.
pub struct AccessEngine {
    /// Normalizer shared by configuration and request paths
    normalizer: RouteNormalizer,
    /// Current public routes
    routes: ArcSwap<PublicRouteSet>,
    /// Metrics
    metrics: Arc<EngineMetrics>,
}

impl AccessEngine {
    /// Create an engine with no public routes
    pub fn new(normalizer: RouteNormalizer) -> Self {
        Self::with_routes(normalizer, PublicRouteSet::new())
    }

    /// Create an engine with an initial route set
    pub fn with_routes(normalizer: RouteNormalizer, routes: PublicRouteSet) -> Self {
        let routes = PublicRouteSet::from_raw(&normalizer, routes.entries());
        AccessEngine {
            normalizer,
            routes: ArcSwap::from_pointee(routes),
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    /// The normalizer used for configuration and request paths
    pub fn normalizer(&self) -> &RouteNormalizer {
        &self.normalizer
    }

    /// Decide whether a request may proceed
    #[instrument(level = "trace", skip(self))]
    pub fn decide(&self, path: &str, authenticated: bool) -> AccessDecision {
        let routes = self.routes.load();
        let decision = decide(&self.normalizer, path, authenticated, &routes);

        debug!(
            path,
            authenticated,
            public_routes = routes.len(),
            allowed = decision.is_allowed(),
            "Access decision"
        );

        self.metrics.record_decision(&decision);
        decision
    }

    /// Sanitize raw routes and publish them as the new public set.
    ///
    /// Returns the canonical set for the caller to persist.
    pub fn set_public_routes<I, S>(&self, raw: I) -> Arc<PublicRouteSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let routes = Arc::new(PublicRouteSet::from_raw(&self.normalizer, raw));
        self.publish(routes.clone());
        routes
    }

    /// Replace the public set wholesale.
    ///
    /// Entries are re-normalized against this engine's prefix first, which
    /// is a no-op for sets built with the same normalizer.
    pub fn replace(&self, routes: PublicRouteSet) -> Arc<PublicRouteSet> {
        self.set_public_routes(routes.entries())
    }

    /// Current snapshot of the public set
    pub fn snapshot(&self) -> Arc<PublicRouteSet> {
        self.routes.load_full()
    }

    /// Get engine metrics
    pub fn metrics(&self) -> Arc<EngineMetrics> {
        self.metrics.clone()
    }

    fn publish(&self, routes: Arc<PublicRouteSet>) {
        let count = routes.len();
        self.routes.store(routes);
        self.metrics.record_publication();
        info!(public_routes = count, "Published public route set");
    }
}

impl Default for AccessEngine {
    fn default() -> Self {
        Self::new(RouteNormalizer::default())
    }
}

/// Engine metrics
#[derive(Debug, Default)]
pub struct EngineMetrics {
    total_decisions: AtomicU64,
    allowed_authenticated: AtomicU64,
    allowed_public: AtomicU64,
    denied: AtomicU64,
    publications: AtomicU64,
}

/// Point-in-time copy of [`EngineMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Decisions made
    pub total_decisions: u64,
    /// Allowed because the caller was authenticated
    pub allowed_authenticated: u64,
    /// Allowed through a public route
    pub allowed_public: u64,
    /// Denied
    pub denied: u64,
    /// Route sets published
    pub publications: u64,
}

impl EngineMetrics {
    fn new() -> Self {
        EngineMetrics::default()
    }

    fn record_decision(&self, decision: &AccessDecision) {
        self.total_decisions.fetch_add(1, Ordering::Relaxed);

        match decision {
            AccessDecision::Allow(Grant::Authenticated) => {
                self.allowed_authenticated.fetch_add(1, Ordering::Relaxed)
            }
            AccessDecision::Allow(Grant::PublicRoute { .. }) => {
                self.allowed_public.fetch_add(1, Ordering::Relaxed)
            }
            AccessDecision::Deny(_) => self.denied.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn record_publication(&self) {
        self.publications.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_decisions: self.total_decisions.load(Ordering::Relaxed),
            allowed_authenticated: self.allowed_authenticated.load(Ordering::Relaxed),
            allowed_public: self.allowed_public.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            publications: self.publications.load(Ordering::Relaxed),
        }
    }
}
