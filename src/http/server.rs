//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for the selected tier
//! - Wire up middleware (tracing, request ID, body limit, timeout, metrics)
//! - Install the inter-tier token check on internal tiers when configured
//! - Bind server to listener and stop on the shutdown signal

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    error_handling::HandleErrorLayer,
    extract::{DefaultBodyLimit, Request, State},
    http::{Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{BoxError, ServiceBuilder};
use tower_http::trace::TraceLayer;

use crate::config::{ProxyConfig, Tier};
use crate::http::auth::require_bearer;
use crate::ProxyError;
use crate::http::gatekeeper::{self, GatekeeperState, TRUSTED_HOST};
use crate::http::relay::{self, RelayState, PROXY};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::routes::{self, RouterState};
use crate::http::upstream::Upstream;
use crate::observability::metrics;
use crate::routing::QueryRouter;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP server for one tier of the pipeline.
pub struct HttpServer {
    tier: Tier,
    router: Router,
}

impl HttpServer {
    /// Create the server for `tier` with the given configuration.
    pub fn new(tier: Tier, config: ProxyConfig) -> Result<Self, ServerError> {
        let upstream_timeout = Duration::from_secs(config.timeouts.upstream_secs);
        let token = config.trust.shared_token.clone();

        let app = match tier {
            Tier::Gatekeeper => {
                let relay = Upstream::new(TRUSTED_HOST, &config.trust.relay_url, upstream_timeout, token)?;
                tracing::info!(relay = %config.trust.relay_url, "Gatekeeper forwarding to Trusted Host");
                gatekeeper::routes(GatekeeperState {
                    relay: Arc::new(relay),
                })
            }
            Tier::Relay => {
                let router = Upstream::new(PROXY, &config.trust.router_url, upstream_timeout, token)?;
                tracing::info!(router = %config.trust.router_url, "Relay forwarding to Proxy");
                relay::routes(RelayState {
                    router: Arc::new(router),
                })
            }
            Tier::Router => {
                let router = Arc::new(QueryRouter::from_config(&config));
                return Ok(Self::with_query_router(config, router));
            }
        };

        Ok(Self::assemble(tier, &config, app))
    }

    /// Router tier around an already-built routing engine.
    pub fn with_query_router(config: ProxyConfig, router: Arc<QueryRouter>) -> Self {
        tracing::info!(
            manager = %router.pool().manager().address,
            workers = ?router.pool().workers().iter().map(|w| w.address.as_str()).collect::<Vec<_>>(),
            customized_policy = router.customized_policy(),
            "Router backend pool loaded"
        );
        let app = routes::routes(RouterState { router });
        Self::assemble(Tier::Router, &config, app)
    }

    fn assemble(tier: Tier, config: &ProxyConfig, app: Router) -> Self {
        let router = Self::build_router(tier, config, app);
        Self { tier, router }
    }

    /// Apply the middleware stack shared by all tiers.
    fn build_router(tier: Tier, config: &ProxyConfig, app: Router) -> Router {
        let mut app = app
            .fallback(no_route)
            .method_not_allowed_fallback(method_not_allowed);

        if tier != Tier::Gatekeeper {
            if let Some(token) = &config.trust.shared_token {
                app = app.layer(middleware::from_fn_with_state(
                    Arc::<str>::from(token.as_str()),
                    require_bearer,
                ));
            }
        }

        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        app.layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(move |err: BoxError| {
                        handle_middleware_error(err, request_timeout)
                    }))
                    .timeout(request_timeout),
            )
            .layer(middleware::from_fn_with_state(tier, track_requests))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The assembled router, for in-process use.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(tier = %self.tier, address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(tier = %self.tier, "HTTP server stopped");
        Ok(())
    }
}

async fn track_requests(State(tier): State<Tier>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    metrics::record_request(tier.as_str(), response.status().as_u16(), start);
    response
}

async fn no_route(method: Method, uri: Uri) -> ProxyError {
    ProxyError::NoRoute {
        method,
        path: uri.path().to_string(),
    }
}

async fn method_not_allowed(method: Method, uri: Uri) -> ProxyError {
    ProxyError::MethodNotAllowed {
        method,
        path: uri.path().to_string(),
    }
}

async fn handle_middleware_error(err: BoxError, request_timeout: Duration) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::error!(timeout = ?request_timeout, "Request timed out");
        return (
            StatusCode::GATEWAY_TIMEOUT,
            Json(json!({ "error": format!("request timed out after {:?}", request_timeout) })),
        )
            .into_response();
    }
    tracing::error!(error = %err, "Unhandled middleware error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("internal error: {}", err) })),
    )
        .into_response()
}
