//! Query executor abstraction.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::load_balancer::backend::Backend;
use crate::query::QueryKind;

/// Result of a statement that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Full result set; each row is an array of column values.
    Rows(Vec<Vec<Value>>),
    /// Write committed.
    Committed,
}

impl QueryOutput {
    /// JSON body returned to the caller.
    pub fn to_json(&self) -> Value {
        match self {
            QueryOutput::Rows(rows) => json!(rows),
            QueryOutput::Committed => json!({ "status": "success" }),
        }
    }
}

/// Driver-level failure, carrying the driver's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct QueryFailure(pub String);

/// Runs one statement against one backend.
#[async_trait]
pub trait QueryExecutor: Send + Sync + std::fmt::Debug {
    async fn execute(
        &self,
        backend: &Backend,
        query: &str,
        kind: QueryKind,
    ) -> Result<QueryOutput, QueryFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_json() {
        assert_eq!(QueryOutput::Committed.to_json(), json!({"status": "success"}));

        let rows = QueryOutput::Rows(vec![vec![json!(1), json!("PENELOPE")], vec![json!(2), Value::Null]]);
        assert_eq!(rows.to_json(), json!([[1, "PENELOPE"], [2, null]]));

        assert_eq!(QueryOutput::Rows(vec![]).to_json(), json!([]));
    }
}
