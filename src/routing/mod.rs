//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Router endpoint (/direct, /random, /customized) + query
//!     → router.rs (classify, select, track, execute)
//!     → load_balancer (policy per strategy)
//!     → database (one connection per statement)
//!     → rows | {"status":"success"} | QueryExecution error
//! ```
//!
//! # Design Decisions
//! - Backend pool is immutable after construction
//! - In-flight tracking is owned by the QueryRouter instance, not process-global
//! - Deterministic classification: leading `select` means read

pub mod router;

pub use router::{CustomizedSelection, QueryRouter};
