//! Language-aware helpers for LLM prompts
//!
//! The answer language follows the request locale set by the locale
//! middleware from `Accept-Language`.

/// Get current logical language code used by LLM prompts.
pub fn current_llm_language() -> String {
    let locale = crate::utils::get_locale();
    match locale.as_str() {
        "zh" => "zh".to_string(),
        _ => "en".to_string(),
    }
}

/// Build a short prompt section that constrains the answer language.
///
/// JSON keys and SQL stay as specified; only free-text values are affected.
pub fn build_language_prompt_section() -> String {
    match current_llm_language().as_str() {
        "zh" => "\n\n## 语言要求\n\
请在所有自然语言字段中使用**简体中文**。JSON 键名和 SQL 语句保持原样。\n"
            .to_string(),
        _ => "\n\n## Language Requirement\n\
Write every natural-language value **in English**. Keep JSON keys and SQL unchanged.\n"
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::with_locale;

    #[tokio::test]
    async fn test_language_follows_locale() {
        assert!(build_language_prompt_section().contains("English"));
        let zh = with_locale("zh-CN", async { build_language_prompt_section() }).await;
        assert!(zh.contains("简体中文"));
    }
}
