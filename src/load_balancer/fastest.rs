//! Lowest-latency load balancing strategy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::health::probe::{LatencyProbe, UNREACHABLE};
use crate::load_balancer::{
    backend::{Backend, BackendPool},
    SelectionPolicy,
};
use crate::observability::metrics;
use crate::query::QueryKind;

/// Probes every worker per read and picks the fastest responder.
#[derive(Debug)]
pub struct FastestPolicy {
    probe: Arc<dyn LatencyProbe>,
}

impl FastestPolicy {
    pub fn new(probe: Arc<dyn LatencyProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl SelectionPolicy for FastestPolicy {
    async fn select(&self, kind: QueryKind, pool: &BackendPool) -> Arc<Backend> {
        if kind == QueryKind::Write {
            return pool.manager().clone();
        }

        let workers = pool.workers();
        // join_all keeps pool order, so ties resolve to the earliest worker.
        let samples: Vec<Duration> =
            join_all(workers.iter().map(|w| self.probe.probe(w))).await;

        for (worker, rtt) in workers.iter().zip(&samples) {
            if *rtt == UNREACHABLE {
                tracing::debug!(backend = %worker.address, "Latency sample: unreachable");
            } else {
                tracing::debug!(backend = %worker.address, rtt_ms = rtt.as_secs_f64() * 1000.0, "Latency sample");
                metrics::record_probe_latency(&worker.address, *rtt);
            }
        }

        workers
            .iter()
            .zip(samples)
            .min_by_key(|(_, rtt)| *rtt)
            .map(|(w, _)| w)
            .unwrap_or(pool.manager())
            .clone()
    }

    fn name(&self) -> &'static str {
        "latency"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::StaticLatencyProbe;
    use crate::load_balancer::backend::Role;

    fn pool() -> BackendPool {
        BackendPool::new(
            Backend::new("10.0.0.1", 3306, Role::Manager),
            vec![
                Backend::new("10.0.0.2", 3306, Role::Worker), // A
                Backend::new("10.0.0.3", 3306, Role::Worker), // B
                Backend::new("10.0.0.4", 3306, Role::Worker), // C
            ],
        )
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[tokio::test]
    async fn test_picks_minimum_latency() {
        let probe = StaticLatencyProbe::new([
            ("10.0.0.2:3306", ms(20)),
            ("10.0.0.3:3306", ms(5)),
            ("10.0.0.4:3306", ms(15)),
        ]);
        let policy = FastestPolicy::new(Arc::new(probe));
        let pool = pool();

        for _ in 0..10 {
            assert_eq!(policy.select(QueryKind::Read, &pool).await.address, "10.0.0.3:3306");
        }
    }

    #[tokio::test]
    async fn test_tie_goes_to_first_worker() {
        let probe = StaticLatencyProbe::new([
            ("10.0.0.2:3306", ms(9)),
            ("10.0.0.3:3306", ms(7)),
            ("10.0.0.4:3306", ms(7)),
        ]);
        let policy = FastestPolicy::new(Arc::new(probe));
        assert_eq!(policy.select(QueryKind::Read, &pool()).await.address, "10.0.0.3:3306");
    }

    #[tokio::test]
    async fn test_unreachable_worker_does_not_abort() {
        // 10.0.0.2 has no sample and reports UNREACHABLE.
        let probe = StaticLatencyProbe::new([("10.0.0.3:3306", ms(30)), ("10.0.0.4:3306", ms(40))]);
        let policy = FastestPolicy::new(Arc::new(probe));
        assert_eq!(policy.select(QueryKind::Read, &pool()).await.address, "10.0.0.3:3306");
    }

    #[tokio::test]
    async fn test_all_unreachable_still_selects_a_worker() {
        let policy = FastestPolicy::new(Arc::new(StaticLatencyProbe::default()));
        let chosen = policy.select(QueryKind::Read, &pool()).await;
        assert_eq!(chosen.address, "10.0.0.2:3306");
    }

    #[tokio::test]
    async fn test_writes_skip_probing() {
        let policy = FastestPolicy::new(Arc::new(StaticLatencyProbe::default()));
        assert!(policy.select(QueryKind::Write, &pool()).await.is_manager());
    }

    #[tokio::test]
    async fn test_empty_workers_fall_back_to_manager() {
        let pool = BackendPool::new(Backend::new("10.0.0.1", 3306, Role::Manager), vec![]);
        let policy = FastestPolicy::new(Arc::new(StaticLatencyProbe::default()));
        assert!(policy.select(QueryKind::Read, &pool).await.is_manager());
    }
}
