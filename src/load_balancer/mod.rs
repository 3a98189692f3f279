//! Backend selection subsystem.
//!
//! # Data Flow
//! ```text
//! Classified query + strategy
//!     → SelectionPolicy for that strategy:
//!         - direct.rs (always the manager)
//!         - random.rs (uniform worker for reads)
//!         - fastest.rs (lowest probed latency for reads)
//!         - least_conn.rs (fewest in-flight requests for reads)
//!     → RoutingDecision
//!     → tracker.rs (in-flight count held for the duration of the query)
//! ```
//!
//! # Design Decisions
//! - Writes always go to the manager, whatever the policy
//! - An empty worker set falls back to the manager instead of failing
//! - Policies own their inputs (tracker or probe); the pool is passed in

pub mod backend;
pub mod direct;
pub mod fastest;
pub mod least_conn;
pub mod random;
pub mod tracker;

use std::sync::Arc;

use async_trait::async_trait;

use crate::query::{QueryKind, Strategy};
use backend::{Backend, BackendPool};

pub use backend::Role;
pub use direct::DirectPolicy;
pub use fastest::FastestPolicy;
pub use least_conn::LeastLoadedPolicy;
pub use random::RandomPolicy;
pub use tracker::{LoadGuard, LoadTracker};

/// Picks one backend for a classified query.
#[async_trait]
pub trait SelectionPolicy: Send + Sync + std::fmt::Debug {
    async fn select(&self, kind: QueryKind, pool: &BackendPool) -> Arc<Backend>;

    /// Policy name (for logging).
    fn name(&self) -> &'static str;
}

/// Output of a selection; consumed immediately by the router.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub strategy: Strategy,
    pub kind: QueryKind,
    pub backend: Arc<Backend>,
}
