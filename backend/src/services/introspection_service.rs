//! Execution metadata gathered from a target database.
//!
//! Every function here returns a JSON value and never fails: errors are
//! embedded as `{"error": "..."}` so the analysis payload keeps its shape.

use serde_json::{Map, Value, json};

use crate::services::mysql_client::{JsonRow, TargetDatabase};
use crate::utils::sql::{build_sample_query, extract_tables, normalize_column_key};

fn rows_to_value(rows: Vec<JsonRow>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

/// `DESCRIBE` output for every table the query references
pub async fn schema_context(db: &dyn TargetDatabase, sql: &str) -> Value {
    let tables = extract_tables(sql);
    tracing::debug!("Describing tables {:?}", tables);

    let mut schema = Map::new();
    for table in tables {
        let entry = match db.describe_table(&table).await {
            Ok(rows) => rows_to_value(rows),
            Err(e) => {
                tracing::warn!("DESCRIBE {} failed: {}", table, e);
                json!({ "error": e.to_string() })
            },
        };
        schema.insert(table, entry);
    }
    Value::Object(schema)
}

pub async fn explain(db: &dyn TargetDatabase, sql: &str) -> Value {
    match db.explain(sql).await {
        Ok(rows) => rows_to_value(rows),
        Err(e) => {
            tracing::error!("EXPLAIN failed: {}", e);
            json!({ "error": e.to_string() })
        },
    }
}

/// Up to `limit` rows of the real result, with aggregate headers normalized
pub async fn sample_rows(db: &dyn TargetDatabase, sql: &str, limit: u32) -> Value {
    let query = build_sample_query(sql, limit);

    match db.fetch_rows(&query).await {
        Ok(rows) if rows.is_empty() => json!({ "rows": [], "message": "Query returned no rows" }),
        Ok(rows) => {
            let cleaned: Vec<Value> = rows
                .into_iter()
                .map(|row| {
                    Value::Object(
                        row.into_iter()
                            .map(|(k, v)| (normalize_column_key(&k), v))
                            .collect(),
                    )
                })
                .collect();
            json!({
                "rows": cleaned,
                "message": format!("Showing up to {} rows from actual query", limit),
            })
        },
        Err(e) => {
            tracing::error!("Sample row fetch failed: {}", e);
            json!({ "error": format!("Sample row fetch failed: {}", e) })
        },
    }
}

/// Column overview of the whole database, grouped by table
pub async fn full_schema(db: &dyn TargetDatabase) -> Value {
    let rows = match db.information_schema_columns().await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Full schema fetch failed: {}", e);
            return json!({ "error": e.to_string() });
        },
    };

    let mut tables: Map<String, Value> = Map::new();
    for row in rows {
        let table = match row.get("TABLE_NAME") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => continue,
        };
        if let Value::Array(columns) = tables.entry(table).or_insert_with(|| Value::Array(Vec::new())) {
            columns.push(Value::Object(row));
        }
    }
    Value::Object(tables)
}
