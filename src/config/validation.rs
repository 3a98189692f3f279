//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that each tier has the next hop or backends it needs
//! - Validate value ranges (timeouts > 0, URLs absolute)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: (Tier, ProxyConfig) → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxyConfig, Tier};
use crate::load_balancer::backend::normalize_address;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate the sections of `config` that `tier` depends on.
pub fn validate_config(tier: Tier, config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    match tier {
        Tier::Gatekeeper => {
            check_next_hop("trust.relay_url", &config.trust.relay_url, &mut errors);
            check_upstream_timeout(config, &mut errors);
        }
        Tier::Relay => {
            check_next_hop("trust.router_url", &config.trust.router_url, &mut errors);
            check_upstream_timeout(config, &mut errors);
        }
        Tier::Router => check_pool(config, &mut errors),
    }

    if let Some(token) = &config.trust.shared_token {
        if token.trim().is_empty() {
            errors.push(ValidationError::new("trust.shared_token", "must not be blank when set"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_next_hop(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.is_empty() {
        errors.push(ValidationError::new(field, "is required"));
        return;
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported URL '{}' (expected http or https with a host)", url),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e))),
    }
}

fn check_upstream_timeout(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than zero"));
    }
}

fn check_pool(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    let pool = &config.backends;
    if pool.manager.trim().is_empty() {
        errors.push(ValidationError::new("backends.manager", "is required"));
    }
    if pool.port == 0 {
        errors.push(ValidationError::new("backends.port", "must be greater than zero"));
    }

    let manager = normalize_address(&pool.manager, pool.port);
    let mut seen = HashSet::new();
    for worker in &pool.workers {
        if worker.trim().is_empty() {
            errors.push(ValidationError::new("backends.workers", "contains an empty address"));
            continue;
        }
        let address = normalize_address(worker, pool.port);
        if address == manager {
            errors.push(ValidationError::new(
                "backends.workers",
                format!("'{}' is also the manager", address),
            ));
        }
        if !seen.insert(address.clone()) {
            errors.push(ValidationError::new(
                "backends.workers",
                format!("'{}' is listed twice", address),
            ));
        }
    }

    if config.timeouts.query_secs == 0 {
        errors.push(ValidationError::new("timeouts.query_secs", "must be greater than zero"));
    }
    if config.routing.probe_timeout_ms == 0 {
        errors.push(ValidationError::new("routing.probe_timeout_ms", "must be greater than zero"));
    }
    if config.database.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "database.connect_timeout_secs",
            "must be greater than zero",
        ));
    }
}
