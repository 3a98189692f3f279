//! In-flight request accounting.
//!
//! # Responsibilities
//! - Count requests currently dispatched to each backend
//! - Release counts on every exit path via an RAII guard
//! - Answer "least loaded" atomically across all counters
//!
//! # Design Decisions
//! - One mutex per pool, not per backend: the minimum scan must not interleave
//!   with individual increments
//! - Counters are created from the pool at startup and never added or removed
//! - Two requests may observe the same minimum and both pick it; that race is
//!   accepted, selection is a heuristic

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::load_balancer::backend::{Backend, BackendPool};
use crate::observability::metrics;

/// Per-backend in-flight counters behind a single lock.
#[derive(Debug)]
pub struct LoadTracker {
    counts: Mutex<HashMap<String, usize>>,
}

impl LoadTracker {
    /// Create a zeroed counter for every backend in the pool, manager included.
    pub fn new(pool: &BackendPool) -> Self {
        let counts = pool.all().map(|b| (b.address.clone(), 0)).collect();
        Self {
            counts: Mutex::new(counts),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, usize>> {
        // A poisoned map still holds valid counts.
        self.counts.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Increment the counter for `address` and return a guard that undoes it.
    pub fn acquire(self: &Arc<Self>, address: &str) -> LoadGuard {
        let tracked = {
            let mut counts = self.lock();
            match counts.get_mut(address) {
                Some(count) => {
                    *count += 1;
                    metrics::record_in_flight(address, *count);
                    true
                }
                None => false,
            }
        };
        if !tracked {
            tracing::warn!(backend = %address, "Acquire on untracked backend ignored");
        }
        LoadGuard {
            tracker: self.clone(),
            address: address.to_string(),
            tracked,
        }
    }

    /// Decrement the counter for `address`. Never goes below zero.
    pub fn release(&self, address: &str) {
        let mut counts = self.lock();
        if let Some(count) = counts.get_mut(address) {
            if *count == 0 {
                tracing::warn!(backend = %address, "Release without matching acquire");
            }
            *count = count.saturating_sub(1);
            metrics::record_in_flight(address, *count);
        }
    }

    /// Current count for `address` (0 if untracked).
    pub fn get(&self, address: &str) -> usize {
        self.lock().get(address).copied().unwrap_or(0)
    }

    /// Copy of all counters.
    pub fn snapshot(&self) -> HashMap<String, usize> {
        self.lock().clone()
    }

    /// Candidate with the fewest in-flight requests, read under one lock.
    /// Ties go to the earliest candidate.
    pub fn least_loaded<'a>(&self, candidates: &'a [Arc<Backend>]) -> Option<&'a Arc<Backend>> {
        let counts = self.lock();
        candidates
            .iter()
            .min_by_key(|b| counts.get(&b.address).copied().unwrap_or(0))
    }
}

/// A RAII guard that releases one in-flight count on drop.
#[derive(Debug)]
pub struct LoadGuard {
    tracker: Arc<LoadTracker>,
    address: String,
    tracked: bool,
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        if self.tracked {
            self.tracker.release(&self.address);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::backend::Role;

    fn pool() -> BackendPool {
        BackendPool::new(
            Backend::new("10.0.0.1", 3306, Role::Manager),
            vec![
                Backend::new("10.0.0.2", 3306, Role::Worker),
                Backend::new("10.0.0.3", 3306, Role::Worker),
            ],
        )
    }

    #[test]
    fn test_counters_start_at_zero() {
        let tracker = LoadTracker::new(&pool());
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.values().all(|&c| c == 0));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let tracker = Arc::new(LoadTracker::new(&pool()));
        {
            let _a = tracker.acquire("10.0.0.2:3306");
            let _b = tracker.acquire("10.0.0.2:3306");
            assert_eq!(tracker.get("10.0.0.2:3306"), 2);
        }
        assert_eq!(tracker.get("10.0.0.2:3306"), 0);
    }

    #[test]
    fn test_release_never_negative() {
        let tracker = LoadTracker::new(&pool());
        tracker.release("10.0.0.1:3306");
        assert_eq!(tracker.get("10.0.0.1:3306"), 0);
    }

    #[test]
    fn test_untracked_backend_is_not_added() {
        let tracker = Arc::new(LoadTracker::new(&pool()));
        let guard = tracker.acquire("10.9.9.9:3306");
        drop(guard);
        assert_eq!(tracker.snapshot().len(), 3);
        assert_eq!(tracker.get("10.9.9.9:3306"), 0);
    }

    #[test]
    fn test_least_loaded_first_minimum_wins() {
        let pool = pool();
        let tracker = Arc::new(LoadTracker::new(&pool));

        let chosen = tracker.least_loaded(pool.workers()).unwrap();
        assert_eq!(chosen.address, "10.0.0.2:3306");

        let _busy = tracker.acquire("10.0.0.2:3306");
        let chosen = tracker.least_loaded(pool.workers()).unwrap();
        assert_eq!(chosen.address, "10.0.0.3:3306");

        assert!(tracker.least_loaded(&[]).is_none());
    }

    #[test]
    fn test_concurrent_acquire_release_nets_zero() {
        let tracker = Arc::new(LoadTracker::new(&pool()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let _g = tracker.acquire("10.0.0.3:3306");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tracker.get("10.0.0.3:3306"), 0);
    }
}
