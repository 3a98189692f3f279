//! Optional bearer-token check between tiers.
//!
//! Installed on the relay and router only when `trust.shared_token` is set.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::ProxyError;

pub async fn require_bearer(
    State(token): State<Arc<str>>,
    request: Request,
    next: Next,
) -> Result<Response, ProxyError> {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|presented| presented == &*token);

    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Rejected request without valid tier token");
        return Err(ProxyError::Unauthorized);
    }
    Ok(next.run(request).await)
}
