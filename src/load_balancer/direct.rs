//! Direct strategy: every statement goes to the manager.

use std::sync::Arc;

use async_trait::async_trait;

use crate::load_balancer::{
    backend::{Backend, BackendPool},
    SelectionPolicy,
};
use crate::query::QueryKind;

#[derive(Debug, Default)]
pub struct DirectPolicy;

impl DirectPolicy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SelectionPolicy for DirectPolicy {
    async fn select(&self, _kind: QueryKind, pool: &BackendPool) -> Arc<Backend> {
        pool.manager().clone()
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}
