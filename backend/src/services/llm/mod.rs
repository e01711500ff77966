//! LLM Service Module
//!
//! Prompt construction and completion calls behind the advisory pipeline.
//!
//! # Architecture
//! ```text
//! ┌─────────────────┐
//! │   LLMService    │  ← prompt + language section, JSON scraping, typed decode
//! └────────┬────────┘
//!          │
//!    ┌─────┴─────┐
//!    ▼           ▼
//! ┌─────────┐ ┌──────────┐
//! │Anthropic│ │  Test    │
//! │ Client  │ │  Fakes   │
//! └─────────┘ └──────────┘
//! ```
//!
//! # Scenarios
//! - Query optimization
//! - Cost estimation
//! - Schema advice (and read-only previews of unsafe statements)
//! - Data validation

mod client;
mod json;
mod models;
mod scenarios;
mod service;

pub use client::{AnthropicClient, LLMClient};
pub use json::extract_json_from_text;
pub use models::*;
pub use scenarios::cost_advisor::*;
pub use scenarios::data_validator::*;
pub use scenarios::query_optimizer::*;
pub use scenarios::schema_advisor::*;
pub use service::{LLMAnalysisRequestTrait, LLMService};
