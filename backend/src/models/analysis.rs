use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::TargetConnection;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AnalyzeRequest {
    pub sql: String,
    #[serde(default = "default_true")]
    pub run_in_sandbox: bool,
    /// Inline target; takes precedence over `profile_id`
    #[validate(nested)]
    pub database: Option<TargetConnection>,
    /// Vault profile of the caller to analyze against
    pub profile_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct AnalyzeSchemaRequest {
    #[validate(nested)]
    pub database: Option<TargetConnection>,
    pub profile_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdvisorStatus {
    Success,
    Error,
    Unsafe,
}

/// Output of one advisor. Failures keep this shape with `{"error": ...}` details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvisorReport {
    pub agent: String,
    pub status: AdvisorStatus,
    pub query: String,
    /// Absent for most advisors; the schema advisor always sends it, `null`
    /// unless it proposed a read-only preview of an unsafe query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub safe_query: Option<Option<String>>,
    #[schema(value_type = Object)]
    pub details: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisResponse {
    pub original_query: String,
    #[schema(value_type = Object)]
    pub schema_context: Value,
    #[schema(value_type = Object)]
    pub explain_plan: Value,
    #[schema(value_type = Object)]
    pub sample_rows: Value,
    /// Optimizer details plus `ai_details` with the other three reports
    #[schema(value_type = Object)]
    pub analysis: Value,
    pub optimized_query: String,
    pub database_used: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SchemaOverview {
    pub database: String,
    #[schema(value_type = Object)]
    pub tables: Value,
}
