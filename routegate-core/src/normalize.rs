//! Route normalization
//!
//! Every configured public route and every inbound request path is reduced
//! to one canonical form before comparison: exactly one leading instance of
//! the API root prefix (for example `/wp-json/`) followed by the remainder of
//! the route with redundant leading separators removed.
//!
//! ```text
//! "  posts  "        → "/wp-json/posts"
//! "wp-json/posts"    → "/wp-json/posts"
//! "/wp-json/posts"   → "/wp-json/posts"
//! "//wp-json//posts" → "/wp-json/posts"
//! ```

use serde::{Deserialize, Serialize};

/// Default API mount point
pub const DEFAULT_ROOT_PREFIX: &str = "/wp-json/";

/// Canonicalizes route strings against a fixed root prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteNormalizer {
    /// Canonical prefix, always of the form `/token/` (or `/` when empty)
    prefix: String,
    /// Root token without its surrounding slashes (`wp-json`)
    token: String,
}

impl RouteNormalizer {
    /// Create a normalizer for the given root prefix.
    ///
    /// The prefix is accepted with or without surrounding slashes;
    /// `"wp-json"`, `"/wp-json"` and `"/wp-json/"` are equivalent.
    pub fn new(root_prefix: &str) -> Self {
        let token = root_prefix.trim().trim_matches('/').to_string();
        let prefix = if token.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", token)
        };

        RouteNormalizer { prefix, token }
    }

    /// The canonical root prefix, e.g. `/wp-json/`
    pub fn root_prefix(&self) -> &str {
        &self.prefix
    }

    /// The bare root token, e.g. `wp-json`
    pub fn root_token(&self) -> &str {
        &self.token
    }

    /// Normalize a configured route.
    ///
    /// Returns `None` when the input is empty after trimming; the caller is
    /// expected to drop it.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(self.canonical(trimmed))
    }

    /// Canonicalize an inbound request path.
    ///
    /// Unlike [`normalize`](Self::normalize) an empty path is meaningful: it
    /// is the API root itself.
    pub fn canonicalize_path(&self, path: &str) -> String {
        self.canonical(path.trim())
    }

    fn canonical(&self, input: &str) -> String {
        let rest = self.strip_root_token(input.trim_start_matches('/'));
        let rest = rest.trim_start_matches('/');

        let mut out = String::with_capacity(self.prefix.len() + rest.len());
        out.push_str(&self.prefix);
        out.push_str(rest);
        out
    }

    /// Strip one leading occurrence of the bare root token.
    ///
    /// The token only counts when it is a whole path segment, so a route
    /// such as `wp-jsonx/data` keeps its first segment intact.
    fn strip_root_token<'a>(&self, input: &'a str) -> &'a str {
        if self.token.is_empty() {
            return input;
        }

        match input.strip_prefix(self.token.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => input,
        }
    }
}

impl Default for RouteNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_forms_are_equivalent() {
        let a = RouteNormalizer::new("wp-json");
        let b = RouteNormalizer::new("/wp-json");
        let c = RouteNormalizer::new(" /wp-json/ ");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.root_prefix(), "/wp-json/");
        assert_eq!(a.root_token(), "wp-json");
    }

    #[test]
    fn test_whitespace_and_prefix_variants_agree() {
        let n = RouteNormalizer::default();
        assert_eq!(n.normalize("  posts  ").as_deref(), Some("/wp-json/posts"));
        assert_eq!(n.normalize("/wp-json/posts").as_deref(), Some("/wp-json/posts"));
        assert_eq!(n.normalize("wp-json/posts").as_deref(), Some("/wp-json/posts"));
    }

    #[test]
    fn test_empty_input_is_dropped() {
        let n = RouteNormalizer::default();
        assert_eq!(n.normalize(""), None);
        assert_eq!(n.normalize("   \t\n"), None);
    }

    #[test]
    fn test_bare_token_is_stripped_once() {
        let n = RouteNormalizer::default();
        assert_eq!(
            n.normalize("/wp-json/wp-json/posts").as_deref(),
            Some("/wp-json/wp-json/posts")
        );
        assert_eq!(n.normalize("wp-json").as_deref(), Some("/wp-json/"));
    }

    #[test]
    fn test_token_must_be_whole_segment() {
        let n = RouteNormalizer::default();
        assert_eq!(
            n.normalize("wp-jsonx/data").as_deref(),
            Some("/wp-json/wp-jsonx/data")
        );
        // Characters of the token are not a strip set
        assert_eq!(n.normalize("/json/data").as_deref(), Some("/wp-json/json/data"));
        assert_eq!(n.normalize("swap/v1").as_deref(), Some("/wp-json/swap/v1"));
    }

    #[test]
    fn test_redundant_separators() {
        let n = RouteNormalizer::default();
        assert_eq!(
            n.normalize("//wp-json//custom/v1").as_deref(),
            Some("/wp-json/custom/v1")
        );
        assert_eq!(n.normalize("///custom").as_deref(), Some("/wp-json/custom"));
    }

    #[test]
    fn test_case_is_preserved() {
        let n = RouteNormalizer::default();
        assert_eq!(n.normalize("WP-JSON/Posts").as_deref(), Some("/wp-json/WP-JSON/Posts"));
    }

    #[test]
    fn test_empty_request_path_is_root() {
        let n = RouteNormalizer::default();
        assert_eq!(n.canonicalize_path(""), "/wp-json/");
        assert_eq!(n.canonicalize_path("/"), "/wp-json/");
        assert_eq!(n.canonicalize_path("/wp-json"), "/wp-json/");
    }

    #[test]
    fn test_empty_root_prefix() {
        let n = RouteNormalizer::new("");
        assert_eq!(n.root_prefix(), "/");
        assert_eq!(n.normalize("api/v1").as_deref(), Some("/api/v1"));
        assert_eq!(n.normalize("/api/v1").as_deref(), Some("/api/v1"));
    }

    #[test]
    fn test_custom_root_prefix() {
        let n = RouteNormalizer::new("/api/");
        assert_eq!(n.normalize("api/users").as_deref(), Some("/api/users"));
        assert_eq!(n.normalize("users").as_deref(), Some("/api/users"));
        assert_eq!(n.normalize("/wp-json/users").as_deref(), Some("/api/wp-json/users"));
    }
}
