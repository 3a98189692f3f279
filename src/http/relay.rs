//! Relay (trusted host) tier.
//!
//! `POST /process` re-validates the body independently of the gatekeeper,
//! maps the strategy to a router path and forwards the statement as the
//! `query` parameter.

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

pub const PROXY: &str = "Proxy";

#[derive(Debug, Clone)]
pub struct RelayState {
    pub router: Arc<Upstream>,
}

pub fn routes(state: RelayState) -> Router {
    Router::new()
        .route("/process", post(process))
        .with_state(state)
}

async fn process(
    State(state): State<RelayState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ProxyError> {
    let body = body.map_err(|e| ProxyError::validation(e.body_text()))?;

    let request = validate_body(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected request");
    })?;

    let path = request.strategy.path();
    tracing::info!(
        router = %state.router.url(path),
        query = %request.query,
        "Forwarding query to Proxy"
    );

    state
        .router
        .post_query(path, &request.query, request_id(&headers))
        .await
}
