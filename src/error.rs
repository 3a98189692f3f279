//! Error taxonomy shared by the three tiers.
//!
//! Every variant renders as `{"error": "<message>"}`; the status code depends
//! on where the failure happened.

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Malformed, missing or out-of-range request fields. Never forwarded.
    #[error("{0}")]
    Validation(String),

    /// The next hop could not be reached (connect failure, timeout, bad body).
    #[error("Failed to reach {hop}: {detail}")]
    UpstreamUnreachable { hop: &'static str, detail: String },

    /// The backend rejected or failed to run the statement.
    #[error("{message}")]
    QueryExecution { message: String, status: StatusCode },

    /// Unknown path on this tier.
    #[error("No route for {method} {path}")]
    NoRoute { method: Method, path: String },

    /// Known path, unsupported verb.
    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: Method, path: String },

    /// Missing or wrong inter-tier bearer token.
    #[error("Unauthorized")]
    Unauthorized,
}

impl ProxyError {
    pub fn validation(message: impl Into<String>) -> Self {
        ProxyError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamUnreachable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::QueryExecution { status, .. } => *status,
            ProxyError::NoRoute { .. } => StatusCode::NOT_FOUND,
            ProxyError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::validation("Invalid strategy").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::UpstreamUnreachable { hop: "Proxy", detail: "refused".into() }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::QueryExecution { message: "x".into(), status: StatusCode::OK }.status(),
            StatusCode::OK
        );
    }

    #[test]
    fn test_routing_errors() {
        let err = ProxyError::MethodNotAllowed {
            method: Method::GET,
            path: "/validate".into(),
        };
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.to_string(), "Method GET not allowed on /validate");

        let err = ProxyError::NoRoute {
            method: Method::POST,
            path: "/process".into(),
        };
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "No route for POST /process");
    }

    #[test]
    fn test_upstream_message() {
        let err = ProxyError::UpstreamUnreachable {
            hop: "Trusted Host",
            detail: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "Failed to reach Trusted Host: connection refused");
    }
}
