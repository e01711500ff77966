use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::models::LLMError;

static FENCE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json\s*|\s*```").unwrap());
static OBJECT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Pull a JSON value out of free-form model output.
///
/// Markdown fences are dropped, then the widest `{...}` span is tried,
/// then the whole text.
pub fn extract_json_from_text(text: &str) -> Result<Value, LLMError> {
    if text.trim().is_empty() {
        return Err(LLMError::ParseError {
            reason: "Empty text".to_string(),
            raw_text: text.to_string(),
        });
    }

    let cleaned = FENCE_REGEX.replace_all(text, "");
    let cleaned = cleaned.trim();

    if let Some(m) = OBJECT_REGEX.find(cleaned)
        && let Ok(value) = serde_json::from_str(m.as_str())
    {
        return Ok(value);
    }

    serde_json::from_str(cleaned).map_err(|e| LLMError::ParseError {
        reason: format!("Could not parse JSON from text: {}", e),
        raw_text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_json() {
        let text = "Here you go:\n```json\n{\"issues\": [], \"confidence\": \"high\"}\n```";
        assert_eq!(
            extract_json_from_text(text).unwrap(),
            json!({"issues": [], "confidence": "high"})
        );
    }

    #[test]
    fn test_object_inside_prose() {
        let text = "The plan scans everything. {\"estimated_cost\": \"high\"} Hope this helps.";
        assert_eq!(extract_json_from_text(text).unwrap()["estimated_cost"], "high");
    }

    #[test]
    fn test_bare_array_falls_back_to_full_text() {
        assert_eq!(extract_json_from_text(" [1, 2] ").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_unparseable_keeps_raw_text() {
        let err = extract_json_from_text("no json {here").unwrap_err();
        match err {
            LLMError::ParseError { raw_text, .. } => assert_eq!(raw_text, "no json {here"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(extract_json_from_text("   ").is_err());
    }
}
