//! Property tests for normalization and access decisions

use proptest::prelude::*;
use routegate_core::{decide, AccessDecision, Grant, PublicRouteSet, RouteNormalizer};

/// Route-like strings: optional slashes, optional root token, a tail and
/// surrounding whitespace.
fn raw_route() -> impl Strategy<Value = String> {
    "[ ]{0,2}[/]{0,3}(wp-json)?[/]{0,3}[a-z0-9/_-]{0,24}[ ]{0,2}"
}

fn route_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(raw_route(), 0..8)
}

proptest! {
    /// Normalizing a canonical route changes nothing.
    #[test]
    fn normalize_is_idempotent(raw in raw_route()) {
        let normalizer = RouteNormalizer::default();
        if let Some(once) = normalizer.normalize(&raw) {
            prop_assert_eq!(normalizer.normalize(&once), Some(once.clone()));
            prop_assert_eq!(normalizer.canonicalize_path(&once), once);
        }
    }

    /// Canonical routes carry exactly one root prefix and no doubled slash
    /// after it.
    #[test]
    fn normalize_yields_single_prefix(raw in raw_route()) {
        let normalizer = RouteNormalizer::default();
        match normalizer.normalize(&raw) {
            Some(canonical) => {
                prop_assert!(canonical.starts_with("/wp-json/"));
                prop_assert!(!canonical["/wp-json/".len()..].starts_with('/'));
            }
            None => prop_assert!(raw.trim().is_empty()),
        }
    }

    /// Built sets hold distinct canonical entries only.
    #[test]
    fn route_sets_are_canonical_and_distinct(raw in route_list()) {
        let normalizer = RouteNormalizer::default();
        let set = PublicRouteSet::from_raw(&normalizer, &raw);

        for (i, entry) in set.entries().iter().enumerate() {
            let normalized = normalizer.normalize(entry);
            prop_assert_eq!(normalized.as_ref(), Some(entry));
            prop_assert!(!set.entries()[..i].contains(entry));
        }
        prop_assert!(set.len() <= raw.len());
    }

    /// Authenticated callers are never denied.
    #[test]
    fn authenticated_always_allowed(raw in route_list(), path in raw_route()) {
        let normalizer = RouteNormalizer::default();
        let set = PublicRouteSet::from_raw(&normalizer, &raw);
        prop_assert_eq!(
            decide(&normalizer, &path, true, &set),
            AccessDecision::Allow(Grant::Authenticated)
        );
    }

    /// With nothing configured every unauthenticated request is denied.
    #[test]
    fn empty_set_denies_everything(path in raw_route()) {
        let normalizer = RouteNormalizer::default();
        let decision = decide(&normalizer, &path, false, &PublicRouteSet::new());
        prop_assert!(!decision.is_allowed());
    }

    /// Anything under a public entry is allowed.
    #[test]
    fn paths_under_public_entry_allowed(
        raw in route_list(),
        pick in any::<prop::sample::Index>(),
        suffix in "[a-z0-9/_-]{0,16}",
    ) {
        let normalizer = RouteNormalizer::default();
        let set = PublicRouteSet::from_raw(&normalizer, &raw);
        prop_assume!(!set.is_empty());

        let entry = pick.get(set.entries());
        let path = format!("{}{}", entry, suffix);
        prop_assert!(decide(&normalizer, &path, false, &set).is_allowed());
    }

    /// Unauthenticated requests are allowed only through a matching entry.
    #[test]
    fn allow_implies_matching_prefix(raw in route_list(), path in raw_route()) {
        let normalizer = RouteNormalizer::default();
        let set = PublicRouteSet::from_raw(&normalizer, &raw);

        match decide(&normalizer, &path, false, &set) {
            AccessDecision::Allow(Grant::PublicRoute { prefix }) => {
                prop_assert!(set.contains(&prefix));
                prop_assert!(normalizer.canonicalize_path(&path).starts_with(&prefix));
            }
            AccessDecision::Allow(Grant::Authenticated) => {
                prop_assert!(false, "unauthenticated request granted as authenticated");
            }
            AccessDecision::Deny(denied) => {
                prop_assert_eq!(denied.status, 401);
                prop_assert!(set.matching_prefix(&normalizer.canonicalize_path(&path)).is_none());
            }
        }
    }
}
