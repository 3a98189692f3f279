//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks for the selected tier)
//!     → ProxyConfig (validated, immutable)
//!     → shared by value/Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup and never mutated
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendPoolConfig, CustomizedPolicy, DatabaseConfig, ListenerConfig, ObservabilityConfig,
    ProxyConfig, QueryErrorStatus, RoutingConfig, SecurityConfig, Tier, TimeoutConfig,
    TrustBoundaryConfig,
};
