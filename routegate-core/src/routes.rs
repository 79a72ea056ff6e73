//! Canonical public route sets

use crate::normalize::RouteNormalizer;
use serde::Serialize;
use std::collections::HashSet;

/// Ordered, deduplicated set of canonical route prefixes.
///
/// A set is only ever built whole through [`PublicRouteSet::from_raw`] and is
/// immutable afterwards; the engine publishes new sets instead of editing
/// existing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PublicRouteSet {
    entries: Vec<String>,
}

impl PublicRouteSet {
    /// Create an empty set (nothing is public)
    pub fn new() -> Self {
        PublicRouteSet::default()
    }

    /// Normalize, drop empties and deduplicate raw route strings.
    ///
    /// The first occurrence of a canonical route keeps its position.
    pub fn from_raw<I, S>(normalizer: &RouteNormalizer, raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let entries = raw
            .into_iter()
            .filter_map(|route| normalizer.normalize(route.as_ref()))
            .filter(|route| seen.insert(route.clone()))
            .collect();

        PublicRouteSet { entries }
    }

    /// Canonical entries in insertion order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the exact canonical route is configured
    pub fn contains(&self, canonical: &str) -> bool {
        self.entries.iter().any(|e| e == canonical)
    }

    /// First entry that is a byte-wise prefix of `canonical_path`
    pub fn matching_prefix(&self, canonical_path: &str) -> Option<&str> {
        self.entries
            .iter()
            .map(String::as_str)
            .find(|entry| canonical_path.starts_with(*entry))
    }

    /// Comma-joined form, as stored in a single form field
    pub fn to_form_field(&self) -> String {
        self.entries.join(",")
    }
}

impl<'a> IntoIterator for &'a PublicRouteSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Split a comma-joined form field into raw route strings.
///
/// Tokens are returned untrimmed; normalization takes care of whitespace
/// and empty tokens.
pub fn split_form_field(field: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    field.split(',').map(str::to_string).collect()
}
