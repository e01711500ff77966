use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Scenario
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LLMScenario {
    QueryOptimization,
    CostEstimation,
    SchemaAdvice,
    UnsafeQueryRewrite,
    DataValidation,
}

impl LLMScenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryOptimization => "query_optimization",
            Self::CostEstimation => "cost_estimation",
            Self::SchemaAdvice => "schema_advice",
            Self::UnsafeQueryRewrite => "unsafe_query_rewrite",
            Self::DataValidation => "data_validation",
        }
    }

    /// Completion budget for the scenario
    pub fn default_max_tokens(&self) -> u32 {
        match self {
            Self::QueryOptimization => 1500,
            Self::CostEstimation => 800,
            Self::SchemaAdvice | Self::UnsafeQueryRewrite => 1200,
            Self::DataValidation => 600,
        }
    }
}

// ============================================================================
// Completion
// ============================================================================

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("LLM API key is not configured")]
    NotConfigured,

    #[error("LLM analysis is disabled")]
    Disabled,

    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("LLM rate limited, retry after {0}s")]
    RateLimited(u64),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    #[error("Failed to parse JSON response: {reason}")]
    ParseError { reason: String, raw_text: String },

    #[error("LLM request failed: {0}")]
    Request(String),
}

impl LLMError {
    /// Raw model output, when the failure happened after a completion arrived
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::ParseError { raw_text, .. } => Some(raw_text),
            _ => None,
        }
    }
}
