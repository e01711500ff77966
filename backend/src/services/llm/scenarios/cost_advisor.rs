//! Cost Advisor Scenario - relative cost estimate from the EXPLAIN plan

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{pretty, render, string_list};
use crate::services::llm::{LLMAnalysisRequestTrait, LLMScenario};

const PROMPT: &str = include_str!("cost_advisor_prompt.md");

#[derive(Debug, Clone, Serialize)]
pub struct CostAdvisorReq {
    pub sql: String,
    pub explain: Value,
}

impl LLMAnalysisRequestTrait for CostAdvisorReq {
    fn scenario(&self) -> LLMScenario {
        LLMScenario::CostEstimation
    }

    fn prompt(&self) -> String {
        render(PROMPT, &[("SQL", self.sql.clone()), ("EXPLAIN", pretty(&self.explain))])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CostAdvisorResp {
    /// A label such as "high" or a number
    #[serde(default)]
    pub estimated_cost: Value,
    #[serde(default, deserialize_with = "string_list")]
    pub cost_saving_tips: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub warnings: Vec<String>,
}
