//! Error types for the HTTP API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use routegate_core::{AccessDenied, RouteGateError};
use serde::Serialize;
use std::fmt;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// Unauthorized (401)
    Unauthorized(String),

    /// Request rejected by the route gate
    Denied(AccessDenied),

    /// Internal server error (500)
    Internal(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),

    /// routegate core error
    Core(RouteGateError),
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Body of a gate denial, in the REST error shape API clients expect:
/// `{"code": ..., "message": ..., "data": {"status": ...}}`
#[derive(Debug, Serialize)]
struct DenialResponse {
    code: &'static str,
    message: &'static str,
    data: DenialData,
}

#[derive(Debug, Serialize)]
struct DenialData {
    status: u16,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Denied(denied) => write!(f, "Denied: {}", denied),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::Core(e) => write!(f, "routegate error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<RouteGateError> for ApiError {
    fn from(err: RouteGateError) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::Denied(denied) => return denial_response(&denied),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg,
                None,
            ),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
            ApiError::Core(e) => core_error_parts(e),
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

fn core_error_parts(err: RouteGateError) -> (StatusCode, &'static str, String, Option<String>) {
    match err {
        RouteGateError::DiscoveryError(msg) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "discovery_unavailable",
            "Route discovery is unavailable".to_string(),
            Some(msg),
        ),
        RouteGateError::SettingsError(_) | RouteGateError::IoError(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "settings_error",
            "Failed to persist settings; current public routes are unchanged".to_string(),
            Some(err.to_string()),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "engine_error",
            format!("routegate error: {}", other),
            None,
        ),
    }
}

fn denial_response(denied: &AccessDenied) -> Response {
    let status = StatusCode::from_u16(denied.status).unwrap_or(StatusCode::UNAUTHORIZED);
    let body = DenialResponse {
        code: denied.code,
        message: denied.message,
        data: DenialData {
            status: denied.status,
        },
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Unauthorized("Missing admin key".to_string());
        assert_eq!(format!("{}", err), "Unauthorized: Missing admin key");

        let err = ApiError::Denied(AccessDenied::unauthorized());
        assert_eq!(
            format!("{}", err),
            "Denied: You are not authorized to access this resource."
        );

        let err = ApiError::ServiceUnavailable("Service down".to_string());
        assert_eq!(format!("{}", err), "Service unavailable: Service down");
    }

    #[test]
    fn test_api_error_from_core_error() {
        let core_err = RouteGateError::SettingsError("disk full".to_string());
        let api_err: ApiError = core_err.into();
        assert!(matches!(api_err, ApiError::Core(_)));
        assert!(format!("{}", api_err).contains("routegate error"));
    }

    #[tokio::test]
    async fn test_denial_uses_rest_error_shape() {
        let response = ApiError::Denied(AccessDenied::unauthorized()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(response).await;
        assert_eq!(json["code"], "rest_forbidden");
        assert_eq!(json["message"], "You are not authorized to access this resource.");
        assert_eq!(json["data"]["status"], 401);
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_api_error_into_response_unauthorized() {
        let response = ApiError::Unauthorized("missing admin key".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(response).await;
        assert_eq!(json["error"], "unauthorized");
        assert_eq!(json["message"], "missing admin key");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_settings_failure_maps_to_500() {
        let err = ApiError::Core(RouteGateError::SettingsError("read-only".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "settings_error");
        assert!(json["details"].as_str().unwrap().contains("read-only"));
    }

    #[tokio::test]
    async fn test_discovery_failure_maps_to_503() {
        let err = ApiError::Core(RouteGateError::DiscoveryError("feed down".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["error"], "discovery_unavailable");
    }
}
