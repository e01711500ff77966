//! Data Validator Scenario - data quality observations on sample rows

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{pretty, render, string_list};
use crate::services::llm::{LLMAnalysisRequestTrait, LLMScenario};

const PROMPT: &str = include_str!("data_validator_prompt.md");

#[derive(Debug, Clone, Serialize)]
pub struct DataValidatorReq {
    pub sql: String,
    pub sample_rows: Value,
}

impl LLMAnalysisRequestTrait for DataValidatorReq {
    fn scenario(&self) -> LLMScenario {
        LLMScenario::DataValidation
    }

    fn prompt(&self) -> String {
        render(PROMPT, &[("SQL", self.sql.clone()), ("SAMPLE_ROWS", pretty(&self.sample_rows))])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DataValidatorResp {
    #[serde(default, deserialize_with = "string_list")]
    pub issues: Vec<String>,
    /// Number or label, passed through as sent
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub reasoning: Option<Value>,
}
