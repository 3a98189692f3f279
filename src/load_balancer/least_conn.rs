//! Least-loaded load balancing strategy.

use std::sync::Arc;

use async_trait::async_trait;

use crate::load_balancer::{
    backend::{Backend, BackendPool},
    tracker::LoadTracker,
    SelectionPolicy,
};
use crate::query::QueryKind;

/// Least in-flight selector.
/// Selects the worker with the fewest requests currently dispatched to it.
#[derive(Debug)]
pub struct LeastLoadedPolicy {
    tracker: Arc<LoadTracker>,
}

impl LeastLoadedPolicy {
    pub fn new(tracker: Arc<LoadTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl SelectionPolicy for LeastLoadedPolicy {
    async fn select(&self, kind: QueryKind, pool: &BackendPool) -> Arc<Backend> {
        if kind == QueryKind::Write {
            return pool.manager().clone();
        }

        // In case of tie, the first one is selected (stability)
        self.tracker
            .least_loaded(pool.workers())
            .unwrap_or(pool.manager())
            .clone()
    }

    fn name(&self) -> &'static str {
        "least_loaded"
    }
}
