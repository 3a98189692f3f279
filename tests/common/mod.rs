//! Shared utilities for the pipeline and load tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    http::{HeaderMap, StatusCode},
    routing::{any, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

use cluster_proxy::config::{ProxyConfig, Tier};
use cluster_proxy::database::{QueryExecutor, QueryFailure, QueryOutput};
use cluster_proxy::health::StaticLatencyProbe;
use cluster_proxy::http::HttpServer;
use cluster_proxy::lifecycle::Shutdown;
use cluster_proxy::load_balancer::backend::{Backend, BackendPool, Role};
use cluster_proxy::query::QueryKind;
use cluster_proxy::routing::{CustomizedSelection, QueryRouter};

pub const MANAGER: &str = "10.0.0.1:3306";
pub const WORKER_A: &str = "10.0.0.2:3306";
pub const WORKER_B: &str = "10.0.0.3:3306";
pub const WORKER_C: &str = "10.0.0.4:3306";

/// One executed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub backend: String,
    pub query: String,
    pub kind: QueryKind,
}

/// In-memory executor: reads return the serving backend's address, writes
/// commit, statements containing `broken` fail.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    delay: Duration,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            delay,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn execute(
        &self,
        backend: &Backend,
        query: &str,
        kind: QueryKind,
    ) -> Result<QueryOutput, QueryFailure> {
        self.calls.lock().unwrap().push(Call {
            backend: backend.address.clone(),
            query: query.to_string(),
            kind,
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if query.contains("broken") {
            return Err(QueryFailure(
                "1064 (42000): You have an error in your SQL syntax".into(),
            ));
        }
        Ok(match kind {
            QueryKind::Read => QueryOutput::Rows(vec![vec![json!(backend.address), json!(1)]]),
            QueryKind::Write => QueryOutput::Committed,
        })
    }
}

/// Manager plus workers A, B and C, in that order.
pub fn test_pool() -> BackendPool {
    BackendPool::new(
        Backend::new("10.0.0.1", 3306, Role::Manager),
        vec![
            Backend::new("10.0.0.2", 3306, Role::Worker),
            Backend::new("10.0.0.3", 3306, Role::Worker),
            Backend::new("10.0.0.4", 3306, Role::Worker),
        ],
    )
}

/// Probe results with B the most responsive worker.
pub fn test_probe() -> StaticLatencyProbe {
    StaticLatencyProbe::new([
        (WORKER_A, Duration::from_millis(20)),
        (WORKER_B, Duration::from_millis(5)),
        (WORKER_C, Duration::from_millis(15)),
    ])
}

/// A tier listening on an ephemeral port. Dropping it stops the server.
pub struct RunningTier {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl RunningTier {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

impl Drop for RunningTier {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

async fn serve(server: HttpServer) -> RunningTier {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    RunningTier { addr, shutdown }
}

/// Router tier over the test pool and executor.
pub async fn start_router(
    config: ProxyConfig,
    executor: Arc<RecordingExecutor>,
) -> (RunningTier, Arc<QueryRouter>) {
    let router = Arc::new(test_router(executor));
    let tier = serve_router(config, router.clone()).await;
    (tier, router)
}

/// Routing engine over the test pool, customized reads by static latency.
pub fn test_router(executor: Arc<RecordingExecutor>) -> QueryRouter {
    QueryRouter::new(
        test_pool(),
        executor,
        CustomizedSelection::Latency(Arc::new(test_probe())),
    )
}

pub async fn serve_router(config: ProxyConfig, router: Arc<QueryRouter>) -> RunningTier {
    serve(HttpServer::with_query_router(config, router)).await
}

pub async fn start_relay(mut config: ProxyConfig, router_url: &str) -> RunningTier {
    config.trust.router_url = router_url.to_string();
    serve(HttpServer::new(Tier::Relay, config).unwrap()).await
}

pub async fn start_gatekeeper(mut config: ProxyConfig, relay_url: &str) -> RunningTier {
    config.trust.relay_url = relay_url.to_string();
    serve(HttpServer::new(Tier::Gatekeeper, config).unwrap()).await
}

/// All three tiers wired together.
pub struct Pipeline {
    pub gatekeeper: RunningTier,
    pub relay: RunningTier,
    pub router: RunningTier,
    pub engine: Arc<QueryRouter>,
    pub executor: Arc<RecordingExecutor>,
}

impl Pipeline {
    pub fn validate_url(&self) -> String {
        format!("{}/validate", self.gatekeeper.url())
    }
}

pub async fn start_pipeline(config: ProxyConfig) -> Pipeline {
    start_pipeline_with(config, Arc::new(RecordingExecutor::new())).await
}

pub async fn start_pipeline_with(config: ProxyConfig, executor: Arc<RecordingExecutor>) -> Pipeline {
    let (router, engine) = start_router(config.clone(), executor.clone()).await;
    let relay = start_relay(config.clone(), &router.url()).await;
    let gatekeeper = start_gatekeeper(config, &relay.url()).await;
    Pipeline {
        gatekeeper,
        relay,
        router,
        engine,
        executor,
    }
}

/// Stand-in relay that only counts the calls it receives.
pub async fn start_counting_relay() -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/process",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::OK, Json(json!({"status": "success"})))
            }
        }),
    );

    (spawn_app(app).await, hits)
}

/// Stand-in next hop that records the `x-request-id` it receives on `path`.
pub async fn start_request_id_recorder(path: &str) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();
    let app = Router::new().route(
        path,
        any(move |headers: HeaderMap| {
            let record = record.clone();
            async move {
                if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
                    record.lock().unwrap().push(id.to_string());
                }
                (StatusCode::OK, Json(json!({"status": "success"})))
            }
        }),
    );
    (spawn_app(app).await, seen)
}

/// HTTP server with no routes: every request gets axum's empty 404.
pub async fn start_empty_server() -> SocketAddr {
    spawn_app(Router::new()).await
}

async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
