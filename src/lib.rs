//! Query routing pipeline for a primary/replica database cluster.
//!
//! Three HTTP tiers sit in front of the database: a public gatekeeper that
//! validates requests, an internal relay that validates them again, and a
//! router that classifies each statement and dispatches it to the manager or
//! a worker according to the requested strategy.

pub mod config;
pub mod database;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod query;
pub mod routing;

pub use config::{ProxyConfig, Tier};
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::QueryRouter;
