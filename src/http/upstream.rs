//! Client for the next hop in the chain.
//!
//! # Responsibilities
//! - Hold one pooled HTTP client per hop, with the hop timeout applied
//! - Attach the request ID and, if configured, the shared bearer token
//! - Map transport failures to `UpstreamUnreachable`
//!
//! # Design Decisions
//! - No retries and no backoff: a failed hop is reported to the caller at once
//! - Dropping the caller's future cancels the outgoing request

use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::response::Response;

use crate::error::ProxyError;
use crate::http::request::X_REQUEST_ID;
use crate::http::response::relay_response;

#[derive(Debug, Clone)]
pub struct Upstream {
    hop: &'static str,
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
}

impl Upstream {
    /// `hop` names the next hop in error messages ("Failed to reach <hop>").
    pub fn new(
        hop: &'static str,
        base_url: &str,
        timeout: Duration,
        token: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            hop,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body, unmodified.
    pub async fn post_json(
        &self,
        path: &str,
        body: Bytes,
        request_id: Option<&str>,
    ) -> Result<Response, ProxyError> {
        let builder = self
            .client
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.send(builder, request_id).await
    }

    /// POST with the statement as the `query` parameter.
    pub async fn post_query(
        &self,
        path: &str,
        query: &str,
        request_id: Option<&str>,
    ) -> Result<Response, ProxyError> {
        let builder = self.client.post(self.url(path)).query(&[("query", query)]);
        self.send(builder, request_id).await
    }

    async fn send(
        &self,
        mut builder: reqwest::RequestBuilder,
        request_id: Option<&str>,
    ) -> Result<Response, ProxyError> {
        if let Some(id) = request_id {
            builder = builder.header(X_REQUEST_ID, id);
        }
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = builder.send().await.map_err(|e| {
            let detail = error_chain(&e);
            tracing::error!(hop = self.hop, error = %detail, "Failed to reach next hop");
            ProxyError::UpstreamUnreachable { hop: self.hop, detail }
        })?;

        relay_response(self.hop, response).await
    }
}

/// Render an error with its sources, e.g. `error sending request: connection refused`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_sources() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"));
        assert_eq!(error_chain(&err), "outer: connection refused");
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let upstream = Upstream::new("Proxy", "http://10.0.0.9:8000/", Duration::from_secs(1), None).unwrap();
        assert_eq!(upstream.url("/random"), "http://10.0.0.9:8000/random");
    }
}
