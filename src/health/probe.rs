//! On-demand backend responsiveness probing.
//!
//! # Responsibilities
//! - Measure how quickly a backend answers, fresh for every routing decision
//! - Bound every probe with a timeout
//! - Report failures as `UNREACHABLE` instead of an error
//!
//! # Design Decisions
//! - Default probe is a TCP connect-and-close to the database port
//! - No caching: samples are never reused across requests

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time;

use crate::load_balancer::backend::Backend;

/// Sentinel for a backend that did not answer within the probe timeout.
pub const UNREACHABLE: Duration = Duration::MAX;

/// Measures a backend's current responsiveness.
#[async_trait]
pub trait LatencyProbe: Send + Sync + std::fmt::Debug {
    /// Round-trip time to `backend`, or [`UNREACHABLE`].
    async fn probe(&self, backend: &Backend) -> Duration;
}

/// TCP connect-and-close probe.
#[derive(Debug, Clone)]
pub struct TcpConnectProbe {
    timeout: Duration,
}

impl TcpConnectProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl LatencyProbe for TcpConnectProbe {
    async fn probe(&self, backend: &Backend) -> Duration {
        let start = Instant::now();
        let connect = TcpStream::connect((backend.host.as_str(), backend.port));

        match time::timeout(self.timeout, connect).await {
            Ok(Ok(stream)) => {
                let elapsed = start.elapsed();
                drop(stream);
                elapsed
            }
            Ok(Err(e)) => {
                tracing::warn!(backend = %backend.address, error = %e, "Probe failed: connection error");
                UNREACHABLE
            }
            Err(_) => {
                tracing::warn!(backend = %backend.address, timeout = ?self.timeout, "Probe failed: timeout");
                UNREACHABLE
            }
        }
    }
}

/// Probe answering from a fixed table; unknown backends are unreachable.
#[derive(Debug, Clone, Default)]
pub struct StaticLatencyProbe {
    samples: HashMap<String, Duration>,
}

impl StaticLatencyProbe {
    pub fn new<I, S>(samples: I) -> Self
    where
        I: IntoIterator<Item = (S, Duration)>,
        S: Into<String>,
    {
        Self {
            samples: samples.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[async_trait]
impl LatencyProbe for StaticLatencyProbe {
    async fn probe(&self, backend: &Backend) -> Duration {
        self.samples.get(&backend.address).copied().unwrap_or(UNREACHABLE)
    }
}
