//! Internationalization utilities for the backend
//!
//! The locale is extracted from the `Accept-Language` header and kept in
//! task-local storage for the lifetime of the request future. Code running
//! outside a scoped request sees the default locale.

use std::future::Future;

tokio::task_local! {
    static CURRENT_LOCALE: String;
}

/// Supported locales
pub const SUPPORTED_LOCALES: &[&str] = &["en", "zh"];
pub const DEFAULT_LOCALE: &str = "en";

/// Run `fut` with `locale` as the current locale
pub async fn with_locale<F>(locale: &str, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_LOCALE.scope(normalize_locale(locale), fut).await
}

/// Get the locale of the current request, or the default outside one
pub fn get_locale() -> String {
    CURRENT_LOCALE
        .try_with(|l| l.clone())
        .unwrap_or_else(|_| DEFAULT_LOCALE.to_string())
}

/// Normalize locale string to supported format
/// Accepts: "zh", "zh-CN", "zh_CN", "en", "en-US", "en_US", etc.
fn normalize_locale(locale: &str) -> String {
    let locale = locale.trim().to_lowercase();

    let primary = locale
        .split(['-', '_', ',', ';'])
        .next()
        .unwrap_or(DEFAULT_LOCALE);

    SUPPORTED_LOCALES
        .iter()
        .find(|l| primary.starts_with(*l))
        .map(|l| l.to_string())
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

/// Extract locale from Accept-Language header value
pub fn extract_locale_from_header(header_value: Option<&str>) -> String {
    match header_value {
        Some(value) => normalize_locale(value),
        None => DEFAULT_LOCALE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("zh"), "zh");
        assert_eq!(normalize_locale("zh-CN"), "zh");
        assert_eq!(normalize_locale("zh_CN"), "zh");
        assert_eq!(normalize_locale("en"), "en");
        assert_eq!(normalize_locale("en-US,en;q=0.9"), "en");
        assert_eq!(normalize_locale("fr"), "en"); // Unsupported, fallback to default
        assert_eq!(normalize_locale(""), "en");
    }

    #[tokio::test]
    async fn test_scoped_locale() {
        assert_eq!(get_locale(), "en");
        let inside = with_locale("zh-CN", async { get_locale() }).await;
        assert_eq!(inside, "zh");
        assert_eq!(get_locale(), "en");
    }

    #[test]
    fn test_header_extraction() {
        assert_eq!(extract_locale_from_header(None), "en");
        assert_eq!(extract_locale_from_header(Some("zh-TW")), "zh");
    }
}
