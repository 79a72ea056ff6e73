//! Admin route catalog
//!
//! Joins the discovery feed with the current public set into the view an
//! administrator edits: routes grouped by namespace, sub-grouped by their
//! first segment after the namespace, each flagged public or private.

use crate::discovery::{group_by_namespace, RouteDescriptor};
use crate::normalize::RouteNormalizer;
use crate::routes::PublicRouteSet;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// One endpoint as shown to the administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEndpoint {
    /// Route relative to the API root
    pub route: String,
    /// Supported methods
    pub methods: BTreeSet<String>,
    /// Canonical form stored when the route is made public
    pub canonical: String,
    /// Explicitly configured as public
    pub public: bool,
    /// A different public entry already exposes this route by prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposed_by: Option<String>,
}

/// Endpoints sharing a first segment after the namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointGroup {
    /// Shared segment
    pub name: String,
    /// Endpoints in discovery order
    pub endpoints: Vec<CatalogEndpoint>,
}

/// All endpoints of one namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceView {
    /// Namespace, e.g. `wp/v2`
    pub namespace: String,
    /// No endpoint of the namespace is public
    pub all_private: bool,
    /// Segments shared by more than one endpoint
    pub groups: Vec<EndpointGroup>,
    /// Endpoints without a shared segment
    pub ungrouped: Vec<CatalogEndpoint>,
}

/// Complete catalog, namespaces in lexical order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteCatalog {
    /// Namespace views
    pub namespaces: Vec<NamespaceView>,
}

impl RouteCatalog {
    /// Build the catalog, optionally filtered by a fuzzy search term
    pub fn build(
        normalizer: &RouteNormalizer,
        routes: Vec<RouteDescriptor>,
        public: &PublicRouteSet,
        search: Option<&str>,
    ) -> Self {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let namespaces = group_by_namespace(routes)
            .into_iter()
            .filter_map(|(namespace, descriptors)| {
                let endpoints: Vec<CatalogEndpoint> = descriptors
                    .into_iter()
                    .map(|d| catalog_endpoint(normalizer, d, public))
                    .collect();
                let view = namespace_view(namespace, endpoints);

                match search {
                    Some(term) => view.filtered(term),
                    None => Some(view),
                }
            })
            .collect();

        RouteCatalog { namespaces }
    }

    /// Total number of listed endpoints
    pub fn endpoint_count(&self) -> usize {
        self.namespaces
            .iter()
            .map(|ns| {
                ns.ungrouped.len() + ns.groups.iter().map(|g| g.endpoints.len()).sum::<usize>()
            })
            .sum()
    }
}

impl NamespaceView {
    fn filtered(mut self, term: &str) -> Option<Self> {
        for group in &mut self.groups {
            group.endpoints.retain(|e| fuzzy_match(term, &e.route));
        }
        self.groups.retain(|g| !g.endpoints.is_empty());
        self.ungrouped.retain(|e| fuzzy_match(term, &e.route));

        if self.groups.is_empty() && self.ungrouped.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

fn catalog_endpoint(
    normalizer: &RouteNormalizer,
    descriptor: RouteDescriptor,
    public: &PublicRouteSet,
) -> CatalogEndpoint {
    let canonical = normalizer.canonicalize_path(&descriptor.route);
    let explicit = public.contains(&canonical);
    let exposed_by = if explicit {
        None
    } else {
        public.matching_prefix(&canonical).map(str::to_string)
    };

    CatalogEndpoint {
        route: descriptor.route,
        methods: descriptor.methods,
        canonical,
        public: explicit,
        exposed_by,
    }
}

fn namespace_view(namespace: String, endpoints: Vec<CatalogEndpoint>) -> NamespaceView {
    let all_private = endpoints.iter().all(|e| !e.public);

    let mut counts: HashMap<String, usize> = HashMap::new();
    for endpoint in &endpoints {
        if let Some(segment) = group_segment(&namespace, &endpoint.route) {
            *counts.entry(segment.to_string()).or_default() += 1;
        }
    }

    let mut groups: Vec<EndpointGroup> = Vec::new();
    let mut ungrouped = Vec::new();

    for endpoint in endpoints {
        let shared = group_segment(&namespace, &endpoint.route)
            .filter(|segment| counts.get(*segment).copied().unwrap_or(0) > 1)
            .map(str::to_string);

        match shared {
            Some(name) => match groups.iter_mut().find(|g| g.name == name) {
                Some(group) => group.endpoints.push(endpoint),
                None => groups.push(EndpointGroup {
                    name,
                    endpoints: vec![endpoint],
                }),
            },
            None => ungrouped.push(endpoint),
        }
    }

    NamespaceView {
        namespace,
        all_private,
        groups,
        ungrouped,
    }
}

/// First path segment following the namespace inside `route`.
///
/// `("wp/v2", "/wp/v2/posts/(?P<id>\d+)")` → `Some("posts")`.
pub fn group_segment<'a>(namespace: &str, route: &'a str) -> Option<&'a str> {
    let start = route.find(namespace)? + namespace.len();
    let rest = route[start..].strip_prefix('/')?;
    let segment = rest.split('/').next().unwrap_or_default();
    (!segment.is_empty()).then_some(segment)
}

/// Case-insensitive in-order subsequence match.
///
/// Every character of `term` must appear in `text` in the same order,
/// not necessarily adjacent. An empty term matches everything.
pub fn fuzzy_match(term: &str, text: &str) -> bool {
    let mut needle = term.chars().flat_map(char::to_lowercase).peekable();
    for ch in text.chars().flat_map(char::to_lowercase) {
        match needle.peek() {
            Some(&want) if want == ch => {
                needle.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    needle.peek().is_none()
}
