//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Client
//!     → gatekeeper.rs  POST /validate   (validate, forward body)
//!     → relay.rs       POST /process    (re-validate, map strategy to path)
//!     → routes.rs      /direct | /random | /customized ?query=
//!     → routing engine → backend
//!
//! Each hop waits for the next (upstream.rs) and relays its answer
//! (response.rs) back unchanged.
//! ```
//!
//! # Design Decisions
//! - Validation is repeated at the relay; it does not trust the gatekeeper
//! - Request ID assigned at the edge and propagated to every hop
//! - Inter-tier authentication is optional (auth.rs); by default trust
//!   depends on network isolation between the tiers

pub mod auth;
pub mod gatekeeper;
pub mod relay;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
pub use upstream::Upstream;
