//! Response handling for relayed calls.
//!
//! # Responsibilities
//! - Hand the next hop's status and body back to the caller unchanged
//! - Re-wrap an upstream `500 {"error": ..}` so the chain of unreachable
//!   hops stays visible at the edge
//! - Turn a non-2xx answer without a JSON `error` (wrong path, foreign
//!   server) into `UpstreamUnreachable`, so every failure carries `error`
//!
//! # Design Decisions
//! - Bodies are buffered, not streamed: responses are small JSON documents
//! - Only the content type is copied; hop-by-hop headers are not forwarded

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, StatusCode},
    response::Response,
};
use serde_json::Value;

use crate::error::ProxyError;

/// Convert the next hop's response into ours.
pub async fn relay_response(
    hop: &'static str,
    upstream: reqwest::Response,
) -> Result<Response, ProxyError> {
    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| ProxyError::UpstreamUnreachable {
            hop,
            detail: crate::http::upstream::error_chain(&e),
        })?;

    if !status.is_success() {
        match error_message(&bytes) {
            Some(inner) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                return Err(ProxyError::UpstreamUnreachable { hop, detail: inner });
            }
            Some(_) => {}
            None => {
                tracing::error!(hop, status = %status, "Next hop answered without an error body");
                return Err(ProxyError::UpstreamUnreachable {
                    hop,
                    detail: format!("{} from upstream", status),
                });
            }
        }
    }

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    Ok(response)
}

/// `error` string of a JSON error body, if that is what `bytes` holds.
pub fn error_message(bytes: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}
