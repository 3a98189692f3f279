//! Random load balancing strategy.

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::load_balancer::{
    backend::{Backend, BackendPool},
    SelectionPolicy,
};
use crate::query::QueryKind;

/// Uniform random selector.
/// Reads go to a random worker, writes to the manager.
#[derive(Debug, Default)]
pub struct RandomPolicy;

impl RandomPolicy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SelectionPolicy for RandomPolicy {
    async fn select(&self, kind: QueryKind, pool: &BackendPool) -> Arc<Backend> {
        if kind == QueryKind::Write {
            return pool.manager().clone();
        }
        pool.workers()
            .choose(&mut rand::thread_rng())
            .unwrap_or(pool.manager())
            .clone()
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::backend::Role;
    use std::collections::HashMap;

    fn pool(workers: usize) -> BackendPool {
        BackendPool::new(
            Backend::new("10.0.0.1", 3306, Role::Manager),
            (0..workers)
                .map(|i| Backend::new(&format!("10.0.1.{}", i), 3306, Role::Worker))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_writes_go_to_manager() {
        let pool = pool(3);
        let policy = RandomPolicy::new();
        for _ in 0..50 {
            assert!(policy.select(QueryKind::Write, &pool).await.is_manager());
        }
    }

    #[tokio::test]
    async fn test_reads_are_uniform_over_workers() {
        let k = 3;
        let trials = 30_000;
        let pool = pool(k);
        let policy = RandomPolicy::new();

        let mut hits: HashMap<String, usize> = HashMap::new();
        for _ in 0..trials {
            let backend = policy.select(QueryKind::Read, &pool).await;
            assert_eq!(backend.role, Role::Worker);
            *hits.entry(backend.address.clone()).or_default() += 1;
        }

        assert_eq!(hits.len(), k);
        let expected = trials as f64 / k as f64;
        for (addr, count) in hits {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(deviation < 0.1, "{} got {} hits, expected ~{}", addr, count, expected);
        }
    }

    #[tokio::test]
    async fn test_empty_workers_fall_back_to_manager() {
        let pool = pool(0);
        let policy = RandomPolicy::new();
        assert!(policy.select(QueryKind::Read, &pool).await.is_manager());
    }
}
