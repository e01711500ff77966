//! LLM Analysis Scenarios
//!
//! Each scenario pairs a request implementing `LLMAnalysisRequestTrait`
//! with the response shape its prompt asks for.

pub mod cost_advisor;
pub mod data_validator;
pub mod language;
pub mod query_optimizer;
pub mod schema_advisor;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Fill `{{NAME}}` placeholders in a prompt template
pub(crate) fn render(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{{{}}}}}", name), value)
    })
}

/// Pretty JSON for embedding request data in a prompt
pub(crate) fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Accept a list of anything; non-string items keep their JSON text, null is empty.
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) => vec![s],
        Some(other) => vec![other.to_string()],
    })
}

/// Accept any JSON for a text field: strings as-is, null as `None`, other
/// values as their JSON text.
pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
