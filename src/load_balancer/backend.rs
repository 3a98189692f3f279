//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single database node and its role
//! - Hold the immutable pool (one manager, ordered workers)
//! - Normalize configured addresses to `host:port`

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::config::BackendPoolConfig;

/// Role of a node in the replicated cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Accepts writes; replication source.
    Manager,
    /// Read-only replica.
    Worker,
}

/// A single database backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    /// Normalized `host:port`; also the load-tracking key.
    pub address: String,
    pub host: String,
    pub port: u16,
    pub role: Role,
}

impl Backend {
    pub fn new(address: &str, default_port: u16, role: Role) -> Self {
        let address = normalize_address(address, default_port);
        let (host, port) = split_host_port(&address, default_port);
        Self {
            address,
            host,
            port,
            role,
        }
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }
}

/// Static description of the cluster, loaded once at startup.
#[derive(Debug, Clone)]
pub struct BackendPool {
    manager: Arc<Backend>,
    workers: Vec<Arc<Backend>>,
}

impl BackendPool {
    pub fn new(manager: Backend, workers: Vec<Backend>) -> Self {
        Self {
            manager: Arc::new(manager),
            workers: workers.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_config(config: &BackendPoolConfig) -> Self {
        let manager = Backend::new(&config.manager, config.port, Role::Manager);
        let workers = config
            .workers
            .iter()
            .map(|w| Backend::new(w, config.port, Role::Worker))
            .collect();
        Self::new(manager, workers)
    }

    pub fn manager(&self) -> &Arc<Backend> {
        &self.manager
    }

    /// Workers in configuration order.
    pub fn workers(&self) -> &[Arc<Backend>] {
        &self.workers
    }

    /// Manager first, then workers.
    pub fn all(&self) -> impl Iterator<Item = &Arc<Backend>> {
        std::iter::once(&self.manager).chain(self.workers.iter())
    }
}

/// Append `default_port` unless the address already carries one.
pub fn normalize_address(address: &str, default_port: u16) -> String {
    let address = address.trim();
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return addr.to_string();
    }
    if let Ok(ip) = address.parse::<IpAddr>() {
        return SocketAddr::new(ip, default_port).to_string();
    }
    match address.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => address.to_string(),
        _ => format!("{}:{}", address, default_port),
    }
}

fn split_host_port(address: &str, default_port: u16) -> (String, u16) {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return (addr.ip().to_string(), addr.port());
    }
    match address.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(default_port)),
        None => (address.to_string(), default_port),
    }
}
