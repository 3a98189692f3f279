//! Query routing engine.
//!
//! # Responsibilities
//! - Classify the statement (read/write)
//! - Ask the strategy's policy for a backend
//! - Hold an in-flight count on that backend while the statement runs
//! - Turn driver failures and timeouts into `QueryExecution` errors
//!
//! # Request lifecycle
//! ```text
//! Received → Classified → BackendSelected → Dispatched → Completed | Failed
//! ```
//! `Failed` is terminal: no retry, no failover to another backend.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::time;

use crate::config::{CustomizedPolicy, ProxyConfig, QueryErrorStatus};
use crate::database::{MySqlExecutor, QueryExecutor, QueryOutput};
use crate::error::ProxyError;
use crate::health::probe::{LatencyProbe, TcpConnectProbe};
use crate::load_balancer::{
    backend::BackendPool, DirectPolicy, FastestPolicy, LeastLoadedPolicy, LoadTracker,
    RandomPolicy, RoutingDecision, SelectionPolicy,
};
use crate::observability::metrics;
use crate::query::{QueryKind, Strategy};

/// Responsiveness measure behind the `customized` strategy.
#[derive(Debug, Clone)]
pub enum CustomizedSelection {
    /// Fresh latency probe of every worker.
    Latency(Arc<dyn LatencyProbe>),
    /// Router's own in-flight counters.
    LeastLoaded,
}

/// Routes statements to backends and executes them.
#[derive(Debug)]
pub struct QueryRouter {
    pool: BackendPool,
    tracker: Arc<LoadTracker>,
    executor: Arc<dyn QueryExecutor>,
    direct: DirectPolicy,
    random: RandomPolicy,
    customized: Box<dyn SelectionPolicy>,
    query_timeout: Duration,
    error_status: StatusCode,
}

impl QueryRouter {
    pub fn new(
        pool: BackendPool,
        executor: Arc<dyn QueryExecutor>,
        customized: CustomizedSelection,
    ) -> Self {
        let tracker = Arc::new(LoadTracker::new(&pool));
        let customized: Box<dyn SelectionPolicy> = match customized {
            CustomizedSelection::Latency(probe) => Box::new(FastestPolicy::new(probe)),
            CustomizedSelection::LeastLoaded => Box::new(LeastLoadedPolicy::new(tracker.clone())),
        };

        Self {
            pool,
            tracker,
            executor,
            direct: DirectPolicy::new(),
            random: RandomPolicy::new(),
            customized,
            query_timeout: Duration::from_secs(30),
            error_status: StatusCode::BAD_GATEWAY,
        }
    }

    /// Build the production router: MySQL executor, TCP probe.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let pool = BackendPool::from_config(&config.backends);
        let executor = Arc::new(MySqlExecutor::new(&config.database));
        Self::with_executor(config, pool, executor)
    }

    /// Build from config around a caller-supplied executor.
    pub fn with_executor(
        config: &ProxyConfig,
        pool: BackendPool,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        let customized = match config.routing.customized_policy {
            CustomizedPolicy::Latency => CustomizedSelection::Latency(Arc::new(TcpConnectProbe::new(
                Duration::from_millis(config.routing.probe_timeout_ms),
            ))),
            CustomizedPolicy::LeastLoaded => CustomizedSelection::LeastLoaded,
        };
        let error_status = match config.routing.query_error_status {
            QueryErrorStatus::BadGateway => StatusCode::BAD_GATEWAY,
            QueryErrorStatus::Ok => StatusCode::OK,
        };

        Self::new(pool, executor, customized)
            .with_query_timeout(Duration::from_secs(config.timeouts.query_secs))
            .with_error_status(error_status)
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Status returned alongside a backend failure.
    pub fn with_error_status(mut self, status: StatusCode) -> Self {
        self.error_status = status;
        self
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    pub fn tracker(&self) -> &Arc<LoadTracker> {
        &self.tracker
    }

    pub fn customized_policy(&self) -> &'static str {
        self.customized.name()
    }

    fn policy(&self, strategy: Strategy) -> &dyn SelectionPolicy {
        match strategy {
            Strategy::Direct => &self.direct,
            Strategy::Random => &self.random,
            Strategy::Customized => self.customized.as_ref(),
        }
    }

    /// Classify and select without dispatching.
    pub async fn decide(&self, strategy: Strategy, query: &str) -> RoutingDecision {
        let kind = QueryKind::classify(query);
        let backend = self.policy(strategy).select(kind, &self.pool).await;
        RoutingDecision {
            strategy,
            kind,
            backend,
        }
    }

    /// Route `query` with `strategy` and run it on the chosen backend.
    pub async fn route(&self, strategy: Strategy, query: &str) -> Result<QueryOutput, ProxyError> {
        let decision = self.decide(strategy, query).await;
        let backend = &decision.backend;

        metrics::record_selection(strategy.as_str(), &backend.address);
        tracing::info!(
            strategy = %strategy,
            kind = %decision.kind,
            backend = %backend.address,
            "Routing query"
        );
        tracing::debug!(backend = %backend.address, query = %query, "Dispatching statement");

        let _in_flight = self.tracker.acquire(&backend.address);
        let execution = self.executor.execute(backend, query, decision.kind);

        match time::timeout(self.query_timeout, execution).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(failure)) => {
                tracing::error!(backend = %backend.address, error = %failure, "Error executing query");
                Err(ProxyError::QueryExecution {
                    message: failure.0,
                    status: self.error_status,
                })
            }
            Err(_) => {
                tracing::error!(backend = %backend.address, timeout = ?self.query_timeout, "Query timed out");
                Err(ProxyError::QueryExecution {
                    message: format!("query timed out after {:?}", self.query_timeout),
                    status: self.error_status,
                })
            }
        }
    }
}
