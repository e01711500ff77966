//! Query Optimizer Scenario - rewrite advice from schema, plan and sample rows

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{optional_text, pretty, render, string_list};
use crate::services::llm::{LLMAnalysisRequestTrait, LLMScenario};

const PROMPT: &str = include_str!("query_optimizer_prompt.md");

#[derive(Debug, Clone, Serialize)]
pub struct QueryOptimizerReq {
    pub sql: String,
    pub schema: Value,
    pub explain: Value,
    pub sample_rows: Value,
}

impl LLMAnalysisRequestTrait for QueryOptimizerReq {
    fn scenario(&self) -> LLMScenario {
        LLMScenario::QueryOptimization
    }

    fn prompt(&self) -> String {
        render(
            PROMPT,
            &[
                ("SQL", self.sql.clone()),
                ("SCHEMA", pretty(&self.schema)),
                ("EXPLAIN", pretty(&self.explain)),
                ("SAMPLE_ROWS", pretty(&self.sample_rows)),
            ],
        )
    }
}

/// Keys the model adds beyond the documented ones are kept in `extra`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryOptimizerResp {
    #[serde(default, deserialize_with = "optional_text", skip_serializing_if = "Option::is_none")]
    pub optimized_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_faster: Option<Value>,
    #[serde(default, deserialize_with = "string_list")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_impact: Option<Value>,
    #[serde(default, deserialize_with = "string_list")]
    pub engine_advice: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub materialization_advice: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
