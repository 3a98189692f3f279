//! Backend responsiveness subsystem.
//!
//! # Data Flow
//! ```text
//! customized read arrives
//!     → probe.rs (probe every worker concurrently, bounded timeout)
//!     → LatencySample per worker (UNREACHABLE on failure)
//!     → selection policy picks the minimum
//! ```
//!
//! # Design Decisions
//! - Probes are issued per decision; nothing is cached between requests
//! - A failing probe never fails the request, it only ranks the worker last

pub mod probe;

pub use probe::{LatencyProbe, StaticLatencyProbe, TcpConnectProbe, UNREACHABLE};
