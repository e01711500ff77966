use async_trait::async_trait;
use mysql_async::consts::ColumnType;
use mysql_async::prelude::Queryable;
use mysql_async::{Pool, Row};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::utils::ApiError;
use crate::utils::sql::quote_identifier;

/// One result row keyed by column name, in column order
pub type JsonRow = Map<String, Value>;

/// Failure talking to a target database. Displays the driver message as-is
/// so it can be embedded in analysis payloads.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("{0}")]
    Connection(String),
    #[error("{0}")]
    Query(String),
}

impl From<TargetError> for ApiError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::Connection(msg) => ApiError::target_connection_failed(msg),
            TargetError::Query(msg) => ApiError::target_query_failed(msg),
        }
    }
}

/// Read-only access to the database a query is analyzed against
#[async_trait]
pub trait TargetDatabase: Send + Sync {
    /// Name of the database the connection is bound to
    fn database_name(&self) -> &str;

    async fn query_rows(&self, sql: &str) -> Result<Vec<JsonRow>, TargetError>;

    async fn describe_table(&self, table: &str) -> Result<Vec<JsonRow>, TargetError> {
        self.query_rows(&format!("DESCRIBE {}", quote_identifier(table)))
            .await
    }

    async fn explain(&self, sql: &str) -> Result<Vec<JsonRow>, TargetError> {
        self.query_rows(&format!("EXPLAIN {}", sql)).await
    }

    async fn fetch_rows(&self, sql: &str) -> Result<Vec<JsonRow>, TargetError> {
        self.query_rows(sql).await
    }

    async fn information_schema_columns(&self) -> Result<Vec<JsonRow>, TargetError> {
        self.query_rows(
            "SELECT TABLE_NAME, COLUMN_NAME, DATA_TYPE, IS_NULLABLE, COLUMN_KEY, COLUMN_TYPE \
             FROM information_schema.columns \
             WHERE table_schema = DATABASE() \
             ORDER BY TABLE_NAME, ORDINAL_POSITION",
        )
        .await
    }
}

pub struct MySQLClient {
    pool: Pool,
    database: String,
}

impl MySQLClient {
    pub fn from_pool(pool: Pool, database: impl Into<String>) -> Self {
        Self { pool, database: database.into() }
    }
}

#[async_trait]
impl TargetDatabase for MySQLClient {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn query_rows(&self, sql: &str) -> Result<Vec<JsonRow>, TargetError> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| TargetError::Connection(e.to_string()))?;

        tracing::debug!("Executing on {}: {}", self.database, sql);

        let rows: Vec<Row> = conn.query(sql).await.map_err(|e| {
            tracing::warn!("Query failed on {}: {}", self.database, e);
            TargetError::Query(e.to_string())
        })?;

        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn row_to_json(row: &Row) -> JsonRow {
    let columns = row.columns_ref();
    let mut out = Map::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let value = row
            .as_ref(idx)
            .map(|v| mysql_value_to_json(v, column.column_type()))
            .unwrap_or(Value::Null);
        out.insert(column.name_str().into_owned(), value);
    }
    out
}

/// Text-protocol values arrive as bytes; numeric columns are parsed back
/// into JSON numbers, anything else stays a string.
fn mysql_value_to_json(value: &mysql_async::Value, column_type: ColumnType) -> Value {
    use mysql_async::Value as My;

    match value {
        My::NULL => Value::Null,
        My::Bytes(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            match column_type {
                ColumnType::MYSQL_TYPE_TINY
                | ColumnType::MYSQL_TYPE_SHORT
                | ColumnType::MYSQL_TYPE_LONG
                | ColumnType::MYSQL_TYPE_LONGLONG
                | ColumnType::MYSQL_TYPE_INT24
                | ColumnType::MYSQL_TYPE_YEAR => text
                    .parse::<i64>()
                    .map(Value::from)
                    .or_else(|_| text.parse::<u64>().map(Value::from))
                    .unwrap_or(Value::String(text)),
                ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
                    text.parse::<f64>().map(Value::from).unwrap_or(Value::String(text))
                },
                // DECIMAL keeps its exact textual form
                _ => Value::String(text),
            }
        },
        My::Int(i) => Value::from(*i),
        My::UInt(u) => Value::from(*u),
        My::Float(f) => Value::from(*f as f64),
        My::Double(d) => Value::from(*d),
        My::Date(year, month, day, hour, min, sec, micro) => {
            if *hour == 0 && *min == 0 && *sec == 0 && *micro == 0 {
                Value::String(format!("{:04}-{:02}-{:02}", year, month, day))
            } else {
                Value::String(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, min, sec
                ))
            }
        },
        My::Time(negative, days, hours, mins, secs, _micros) => {
            let total_hours = (*days as u32) * 24 + (*hours as u32);
            let sign = if *negative { "-" } else { "" };
            Value::String(format!("{}{:02}:{:02}:{:02}", sign, total_hours, mins, secs))
        },
    }
}
