// Common test utilities and helpers

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::time::Duration;

use crate::services::llm::{CompletionRequest, LLMClient, LLMError};
use crate::services::mysql_client::{JsonRow, TargetDatabase, TargetError};

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Insert a user row directly, skipping password hashing
pub async fn create_user(pool: &SqlitePool, email: &str) -> i64 {
    sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, 'x')")
        .bind(email)
        .execute(pool)
        .await
        .expect("Failed to insert user")
        .last_insert_rowid()
}

// ============================================================================
// Fake target database
// ============================================================================

enum Matcher {
    Exact(String),
    Prefix(String),
}

/// Scripted `TargetDatabase`: the first matching rule answers, anything
/// else fails like an unknown statement would.
pub struct FakeTarget {
    database: String,
    rules: Vec<(Matcher, Result<Vec<JsonRow>, String>)>,
}

impl FakeTarget {
    pub fn new(database: &str) -> Self {
        Self { database: database.to_string(), rules: Vec::new() }
    }

    pub fn on(mut self, sql: &str, result: Result<Vec<JsonRow>, &str>) -> Self {
        self.rules.push((Matcher::Exact(sql.to_string()), result.map_err(str::to_string)));
        self
    }

    pub fn on_prefix(mut self, prefix: &str, result: Result<Vec<JsonRow>, &str>) -> Self {
        self.rules.push((Matcher::Prefix(prefix.to_string()), result.map_err(str::to_string)));
        self
    }

    pub fn row(cells: &[(&str, Value)]) -> JsonRow {
        cells.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }
}

#[async_trait]
impl TargetDatabase for FakeTarget {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn query_rows(&self, sql: &str) -> Result<Vec<JsonRow>, TargetError> {
        for (matcher, result) in &self.rules {
            let hit = match matcher {
                Matcher::Exact(s) => s == sql,
                Matcher::Prefix(p) => sql.starts_with(p.as_str()),
            };
            if hit {
                return result.clone().map_err(TargetError::Query);
            }
        }
        Err(TargetError::Query(format!("unexpected statement: {}", sql)))
    }
}

// ============================================================================
// Fake LLM
// ============================================================================

/// Answers with the first scripted reply whose marker appears in the prompt
pub struct FakeLLM {
    replies: Vec<(String, String)>,
}

impl FakeLLM {
    pub fn new() -> Self {
        Self { replies: Vec::new() }
    }

    pub fn when(mut self, marker: &str, reply: &str) -> Self {
        self.replies.push((marker.to_string(), reply.to_string()));
        self
    }
}

#[async_trait]
impl LLMClient for FakeLLM {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LLMError> {
        self.replies
            .iter()
            .find(|(marker, _)| request.prompt.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| LLMError::ApiError("no scripted reply".to_string()))
    }
}
