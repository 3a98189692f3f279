//! Gatekeeper tier: the only hop reachable from untrusted clients.
//!
//! `POST /validate` checks the body shape, then forwards the body unmodified
//! to the relay and returns the relay's answer.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::HeaderMap,
    response::Response,
    routing::post,
    Router,
};

use crate::error::ProxyError;
use crate::http::request::request_id;
use crate::http::upstream::Upstream;
use crate::query::validate_body;

pub const TRUSTED_HOST: &str = "Trusted Host";

#[derive(Debug, Clone)]
pub struct GatekeeperState {
    pub relay: Arc<Upstream>,
}

pub fn routes(state: GatekeeperState) -> Router {
    Router::new()
        .route("/validate", post(validate))
        .with_state(state)
}

async fn validate(
    State(state): State<GatekeeperState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ProxyError> {
    let body = body.map_err(|e| ProxyError::validation(e.body_text()))?;

    let request = validate_body(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected request");
    })?;

    tracing::info!(
        request_type = %request.declared,
        strategy = %request.strategy,
        query = %request.query,
        "Forwarding validated request to Trusted Host"
    );

    state.relay.post_json("/process", body, request_id(&headers)).await
}
