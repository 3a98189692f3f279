//! Backend query execution.
//!
//! # Data Flow
//! ```text
//! RoutingDecision + SQL text
//!     → executor.rs (QueryExecutor trait)
//!     → mysql.rs (open connection, run, commit writes, close)
//!     → QueryOutput | QueryFailure
//! ```
//!
//! # Design Decisions
//! - One connection per request, closed on every exit path; no pooling
//! - Reads return every row; writes return a success marker after COMMIT

pub mod executor;
pub mod mysql;

pub use executor::{QueryExecutor, QueryFailure, QueryOutput};
pub use mysql::MySqlExecutor;
