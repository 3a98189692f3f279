//! Request body validation, applied independently by the gatekeeper and the
//! relay.
//!
//! Checks run in a fixed order and the first failure wins:
//! empty body → `type` → `query` → `strategy`.

use serde_json::{Map, Value};

use crate::error::ProxyError;
use crate::query::{QueryKind, Strategy};

/// A request body that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    /// Kind the caller declared in `type`.
    pub declared: QueryKind,
    pub query: String,
    pub strategy: Strategy,
}

impl ValidatedRequest {
    /// Kind derived from the statement itself; this, not `declared`, drives routing.
    pub fn kind(&self) -> QueryKind {
        QueryKind::classify(&self.query)
    }
}

/// Validate a raw JSON request body.
pub fn validate_body(body: &[u8]) -> Result<ValidatedRequest, ProxyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ProxyError::validation("No data provided"));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ProxyError::validation(format!("Invalid JSON body: {}", e)))?;

    match value {
        Value::Object(map) if !map.is_empty() => validate_fields(&map),
        _ => Err(ProxyError::validation("No data provided")),
    }
}

fn validate_fields(map: &Map<String, Value>) -> Result<ValidatedRequest, ProxyError> {
    let declared = map
        .get("type")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<QueryKind>().ok())
        .ok_or_else(|| ProxyError::validation("Invalid query type"))?;

    let query = match map.get("query").and_then(Value::as_str) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => return Err(ProxyError::validation("No query provided")),
    };

    let strategy = match map.get("strategy") {
        None => Strategy::default(),
        Some(v) => v
            .as_str()
            .and_then(|s| s.parse::<Strategy>().ok())
            .ok_or_else(|| ProxyError::validation("Invalid strategy"))?,
    };

    Ok(ValidatedRequest {
        declared,
        query,
        strategy,
    })
}
