//! MySQL executor.
//!
//! Opens a fresh connection per statement, runs it, commits writes and
//! disconnects. A dropped future (client went away) drops the connection.

use std::time::Duration;

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder, Row, Value as SqlValue};
use serde_json::{json, Value};
use tokio::time;

use crate::config::DatabaseConfig;
use crate::database::executor::{QueryExecutor, QueryFailure, QueryOutput};
use crate::load_balancer::backend::Backend;
use crate::query::QueryKind;

#[derive(Debug, Clone)]
pub struct MySqlExecutor {
    user: String,
    password: String,
    database: String,
    connect_timeout: Duration,
}

impl MySqlExecutor {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            user: config.user.clone(),
            password: config.password.clone(),
            database: config.name.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }

    fn opts(&self, backend: &Backend) -> OptsBuilder {
        OptsBuilder::default()
            .ip_or_hostname(backend.host.clone())
            .tcp_port(backend.port)
            .user(Some(self.user.clone()))
            .pass(Some(self.password.clone()))
            .db_name(Some(self.database.clone()))
    }

    async fn connect(&self, backend: &Backend) -> Result<Conn, QueryFailure> {
        match time::timeout(self.connect_timeout, Conn::new(self.opts(backend))).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(QueryFailure(e.to_string())),
            Err(_) => Err(QueryFailure(format!(
                "connect to {} timed out after {:?}",
                backend.address, self.connect_timeout
            ))),
        }
    }
}

#[async_trait]
impl QueryExecutor for MySqlExecutor {
    async fn execute(
        &self,
        backend: &Backend,
        query: &str,
        kind: QueryKind,
    ) -> Result<QueryOutput, QueryFailure> {
        let mut conn = self.connect(backend).await?;

        let result = match kind {
            QueryKind::Read => conn
                .query::<Row, _>(query)
                .await
                .map(|rows| QueryOutput::Rows(rows.iter().map(row_to_json).collect())),
            QueryKind::Write => match conn.query_drop(query).await {
                Ok(()) => conn.query_drop("COMMIT").await.map(|_| QueryOutput::Committed),
                Err(e) => Err(e),
            },
        };

        if let Err(e) = conn.disconnect().await {
            tracing::debug!(backend = %backend.address, error = %e, "Disconnect failed");
        }

        result.map_err(|e| QueryFailure(e.to_string()))
    }
}

fn row_to_json(row: &Row) -> Vec<Value> {
    (0..row.len())
        .map(|i| row.as_ref(i).map(value_to_json).unwrap_or(Value::Null))
        .collect()
}

/// Render a column value the way a JSON client expects it.
pub fn value_to_json(value: &SqlValue) -> Value {
    match value {
        SqlValue::NULL => Value::Null,
        SqlValue::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        SqlValue::Int(v) => json!(v),
        SqlValue::UInt(v) => json!(v),
        SqlValue::Float(v) => json!(v),
        SqlValue::Double(v) => json!(v),
        SqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let mut s = format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            );
            if *micros > 0 {
                s.push_str(&format!(".{:06}", micros));
            }
            Value::String(s)
        }
        SqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = u64::from(*days) * 24 + u64::from(*hours);
            let mut s = format!(
                "{}{:02}:{:02}:{:02}",
                if *negative { "-" } else { "" },
                total_hours,
                minutes,
                seconds
            );
            if *micros > 0 {
                s.push_str(&format!(".{:06}", micros));
            }
            Value::String(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_values() {
        assert_eq!(value_to_json(&SqlValue::NULL), Value::Null);
        assert_eq!(value_to_json(&SqlValue::Int(-3)), json!(-3));
        assert_eq!(value_to_json(&SqlValue::UInt(7)), json!(7));
        assert_eq!(value_to_json(&SqlValue::Double(1.5)), json!(1.5));
        assert_eq!(value_to_json(&SqlValue::Bytes(b"PENELOPE".to_vec())), json!("PENELOPE"));
    }

    #[test]
    fn test_temporal_values() {
        assert_eq!(
            value_to_json(&SqlValue::Date(2006, 2, 15, 4, 34, 33, 0)),
            json!("2006-02-15 04:34:33")
        );
        assert_eq!(
            value_to_json(&SqlValue::Date(2006, 2, 15, 4, 34, 33, 120)),
            json!("2006-02-15 04:34:33.000120")
        );
        assert_eq!(value_to_json(&SqlValue::Time(true, 1, 2, 3, 4, 0)), json!("-26:03:04"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_reports_driver_error() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let backend = Backend::new(&addr.to_string(), 3306, crate::load_balancer::Role::Manager);
        let executor = MySqlExecutor::new(&DatabaseConfig {
            connect_timeout_secs: 2,
            ..Default::default()
        });

        let err = executor.execute(&backend, "SELECT 1", QueryKind::Read).await.unwrap_err();
        assert!(!err.0.is_empty());
    }
}
