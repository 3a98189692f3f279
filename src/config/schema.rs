//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure shared by the
//! three tiers. All types derive Serde traits for deserialization from config
//! files; each tier reads only the sections it needs.

use serde::{Deserialize, Serialize};

/// The three hops of the pipeline. A process runs exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Tier {
    /// Public edge validator (`POST /validate`).
    Gatekeeper,
    /// Internal trusted host (`POST /process`).
    Relay,
    /// Routing engine in front of the database (`/direct`, `/random`, `/customized`).
    Router,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Gatekeeper => "gatekeeper",
            Tier::Relay => "relay",
            Tier::Router => "router",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration for every tier of the cluster proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Manager and worker addresses of the database cluster.
    pub backends: BackendPoolConfig,

    /// Credentials used by the router to reach the database.
    pub database: DatabaseConfig,

    /// Next-hop URLs between the tiers.
    pub trust: TrustBoundaryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Backend selection settings.
    pub routing: RoutingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Static description of the database cluster.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendPoolConfig {
    /// Address of the single manager (replication source).
    pub manager: String,

    /// Ordered worker (replica) addresses.
    pub workers: Vec<String>,

    /// Port applied to addresses that do not carry one.
    pub port: u16,
}

impl Default for BackendPoolConfig {
    fn default() -> Self {
        Self {
            manager: String::new(),
            workers: Vec::new(),
            port: 3306,
        }
    }
}

/// Database credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    /// Schema selected on connect.
    pub name: String,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: "replica_user".to_string(),
            password: String::new(),
            name: "sakila".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Next-hop addresses for each trust boundary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TrustBoundaryConfig {
    /// Base URL of the relay, used by the gatekeeper (e.g. "http://10.0.0.5:8000").
    pub relay_url: String,

    /// Base URL of the router, used by the relay.
    pub router_url: String,

    /// Optional bearer token shared by the tiers. When unset, trust between
    /// tiers rests on network isolation alone.
    pub shared_token: Option<String>,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for an inbound request, in seconds.
    pub request_secs: u64,

    /// Time allowed for a call to the next hop, in seconds.
    pub upstream_secs: u64,

    /// Time allowed for a statement to run on a backend, in seconds.
    pub query_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upstream_secs: 45,
            query_secs: 30,
        }
    }
}

/// Which responsiveness measure drives the `customized` strategy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomizedPolicy {
    /// Fresh TCP connect probe per decision; fastest worker wins.
    #[default]
    Latency,
    /// Worker with the fewest in-flight requests wins.
    LeastLoaded,
}

/// Status code returned by the router when a backend rejects a statement.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryErrorStatus {
    /// 502 Bad Gateway.
    #[default]
    BadGateway,
    /// 200 OK with an `error` body, as older clients expect.
    Ok,
}

/// Backend selection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub customized_policy: CustomizedPolicy,

    /// Upper bound on a single latency probe, in milliseconds.
    pub probe_timeout_ms: u64,

    pub query_error_status: QueryErrorStatus,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            customized_policy: CustomizedPolicy::default(),
            probe_timeout_ms: 2000,
            query_error_status: QueryErrorStatus::default(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}
