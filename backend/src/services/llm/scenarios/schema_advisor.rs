//! Schema Advisor Scenario
//!
//! Safe queries get index and column-type advice. A statement containing a
//! data-modifying keyword is never described to the model as runnable; the
//! model is asked for a read-only preview instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{optional_text, pretty, render, string_list};
use crate::services::llm::{LLMAnalysisRequestTrait, LLMScenario};

const PROMPT: &str = include_str!("schema_advisor_prompt.md");
const UNSAFE_PROMPT: &str = include_str!("unsafe_query_prompt.md");

#[derive(Debug, Clone, Serialize)]
pub struct SchemaAdvisorReq {
    pub sql: String,
    pub schema: Value,
}

impl LLMAnalysisRequestTrait for SchemaAdvisorReq {
    fn scenario(&self) -> LLMScenario {
        LLMScenario::SchemaAdvice
    }

    fn prompt(&self) -> String {
        render(PROMPT, &[("SQL", self.sql.clone()), ("SCHEMA", pretty(&self.schema))])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchemaAdvisorResp {
    #[serde(default, deserialize_with = "string_list")]
    pub recommended_indexes: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub schema_changes: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnsafeQueryReq {
    pub sql: String,
}

impl LLMAnalysisRequestTrait for UnsafeQueryReq {
    fn scenario(&self) -> LLMScenario {
        LLMScenario::UnsafeQueryRewrite
    }

    fn prompt(&self) -> String {
        render(UNSAFE_PROMPT, &[("SQL", self.sql.clone())])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnsafeQueryResp {
    #[serde(default, deserialize_with = "optional_text")]
    pub safe_preview: Option<String>,
    #[serde(default)]
    pub explanation: Option<Value>,
}
