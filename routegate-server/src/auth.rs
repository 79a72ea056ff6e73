//! Authentication hook and the route gate middleware
//!
//! The gate sits in front of the protected API surface. It asks the
//! configured [`Authenticator`] whether the caller is logged in, hands the
//! request path to the engine and either forwards the request with the
//! decision in its extensions or answers 401.
//!
//! ```text
//! request → Authenticator::is_authenticated → AccessEngine::decide
//!         → Allow: extensions += AccessDecision → handler
//!         → Deny:  401 {"code": "rest_forbidden", ...}
//! ```

use crate::error::ApiError;
use crate::metrics::{record_decision, LatencyTimer};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use routegate_core::config::AuthSection;
use routegate_core::AccessDecision;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Decides whether a request comes from an authenticated caller
pub trait Authenticator: Send + Sync {
    /// Inspect request headers
    fn is_authenticated(&self, headers: &HeaderMap) -> bool;
}

/// Header-based authentication: a known bearer token or a session cookie.
///
/// Only presence is checked for the cookie; validating the session itself
/// belongs to the upstream login system.
#[derive(Clone, Default)]
pub struct HeaderAuthenticator {
    bearer_tokens: Vec<String>,
    session_cookie: Option<String>,
}

impl std::fmt::Debug for HeaderAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderAuthenticator")
            .field("bearer_tokens", &format!("[{} REDACTED]", self.bearer_tokens.len()))
            .field("session_cookie", &self.session_cookie)
            .finish()
    }
}

impl HeaderAuthenticator {
    /// Create from explicit tokens and an optional cookie name prefix
    pub fn new<I, S>(bearer_tokens: I, session_cookie: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = bearer_tokens.into_iter().map(Into::into).collect();
        tokens.sort();
        tokens.dedup();
        HeaderAuthenticator {
            bearer_tokens: tokens,
            session_cookie: session_cookie.filter(|c| !c.trim().is_empty()),
        }
    }

    /// Create from the `[auth]` configuration section
    pub fn from_config(auth: &AuthSection) -> Self {
        Self::new(auth.bearer_tokens.iter().cloned(), auth.session_cookie.clone())
    }

    fn has_bearer_token(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| {
                let token = token.trim();
                // No early exit: every configured token is compared.
                self.bearer_tokens
                    .iter()
                    .fold(false, |found, expected| {
                        constant_time_token_eq(token, expected) | found
                    })
            })
            .unwrap_or(false)
    }

    // Session cookie names may carry a per-site suffix
    // (`wordpress_logged_in_<hash>`), so the configured name is a prefix.
    fn has_session_cookie(&self, headers: &HeaderMap) -> bool {
        let Some(name) = &self.session_cookie else {
            return false;
        };

        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(key, value)| key.starts_with(name.as_str()) && !value.is_empty())
    }
}

impl Authenticator for HeaderAuthenticator {
    fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        self.has_bearer_token(headers) || self.has_session_cookie(headers)
    }
}

/// Constant-time comparison of bearer tokens.
///
/// When lengths differ a dummy comparison still runs, so the mismatch
/// position and the expected length do not show in timing.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Route gate middleware for the protected API surface
pub async fn gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let timer = LatencyTimer::new("routegate_decision_latency_seconds");
    let authenticated = state.authenticator.is_authenticated(request.headers());
    let decision = state.engine.decide(request.uri().path(), authenticated);
    timer.record();
    record_decision(&decision);

    match decision {
        AccessDecision::Allow(_) => {
            debug!(path = %request.uri().path(), "Request passed the route gate");
            request.extensions_mut().insert(decision);
            next.run(request).await
        }
        AccessDecision::Deny(denied) => {
            debug!(path = %request.uri().path(), "Request rejected by the route gate");
            ApiError::Denied(denied).into_response()
        }
    }
}

/// Admin key middleware for `/admin/*`
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(key) if constant_time_token_eq(key, &state.admin_api_key) => {
            Ok(next.run(request).await)
        }
        Some(_) => {
            warn!("Admin authentication failed: invalid key");
            Err(ApiError::Unauthorized("invalid admin key".to_string()))
        }
        None => {
            warn!("Admin authentication failed: missing authorization header");
            Err(ApiError::Unauthorized("missing admin key".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn authenticator() -> HeaderAuthenticator {
        HeaderAuthenticator::new(["secret-token"], Some("wordpress_logged_in".to_string()))
    }

    #[test]
    fn test_bearer_token() {
        let auth = authenticator();
        assert!(auth.is_authenticated(&headers(&[(
            header::AUTHORIZATION,
            "Bearer secret-token"
        )])));
        assert!(!auth.is_authenticated(&headers(&[(header::AUTHORIZATION, "Bearer other")])));
        assert!(!auth.is_authenticated(&headers(&[(header::AUTHORIZATION, "Basic secret-token")])));
        assert!(!auth.is_authenticated(&HeaderMap::new()));
    }

    #[test]
    fn test_session_cookie() {
        let auth = authenticator();
        assert!(auth.is_authenticated(&headers(&[(
            header::COOKIE,
            "theme=dark; wordpress_logged_in_abc123=admin%7C1700000000"
        )])));
        assert!(auth.is_authenticated(&headers(&[
            (header::COOKIE, "theme=dark"),
            (header::COOKIE, "wordpress_logged_in=1"),
        ])));
        assert!(!auth.is_authenticated(&headers(&[(header::COOKIE, "wordpress_logged_in=")])));
        assert!(!auth.is_authenticated(&headers(&[(header::COOKIE, "theme=dark")])));
    }

    #[test]
    fn test_empty_cookie_name_disables_cookie_auth() {
        let auth = HeaderAuthenticator::new(Vec::<String>::new(), Some("  ".to_string()));
        assert!(!auth.is_authenticated(&headers(&[(header::COOKIE, "anything=1")])));
    }

    #[test]
    fn test_from_config() {
        let section = AuthSection {
            bearer_tokens: vec!["t1".to_string()],
            session_cookie: None,
        };
        let auth = HeaderAuthenticator::from_config(&section);
        assert!(auth.is_authenticated(&headers(&[(header::AUTHORIZATION, "Bearer t1")])));
        assert!(!auth.is_authenticated(&headers(&[(header::COOKIE, "session=1")])));
    }

    #[test]
    fn test_constant_time_token_eq() {
        assert!(constant_time_token_eq("abcde", "abcde"));
        assert!(!constant_time_token_eq("abcdX", "abcde"));
        assert!(!constant_time_token_eq("aXXXX", "abcde"));
        assert!(!constant_time_token_eq("abcd", "abcde"));
        assert!(!constant_time_token_eq("abcdef", "abcde"));
        assert!(!constant_time_token_eq("", "abcde"));
        assert!(constant_time_token_eq("", ""));
    }

    #[test]
    fn test_any_configured_bearer_token_matches() {
        let auth = HeaderAuthenticator::new(["first", "second", "first"], None);
        assert_eq!(auth.bearer_tokens.len(), 2);
        assert!(auth.is_authenticated(&headers(&[(header::AUTHORIZATION, "Bearer second")])));
        assert!(auth.is_authenticated(&headers(&[(header::AUTHORIZATION, "Bearer  first ")])));
        assert!(!auth.is_authenticated(&headers(&[(header::AUTHORIZATION, "Bearer secon")])));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", authenticator());
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("REDACTED"));
    }
}
