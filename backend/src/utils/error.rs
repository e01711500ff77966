use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_i18n::t;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use super::i18n::get_locale;

/// API Error with rich context and automatic error trait implementations
///
/// Each variant carries the context needed to build a localized message.
#[derive(Error, Debug)]
pub enum ApiError {
    // Authentication errors 1xxx
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    // Target database errors 2xxx
    #[error("Failed to connect to target database: {message}")]
    TargetConnectionFailed { message: String },

    #[error("Target database query failed: {0}")]
    TargetQueryFailed(String),

    #[error("SSH tunneling is not supported")]
    SshNotSupported,

    #[error("No target database configured")]
    TargetMissing,

    // Resource errors 3xxx
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Vault profile {profile_id} not found")]
    ProfileNotFound { profile_id: i64 },

    // Validation errors 4xxx
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("SQL query cannot be empty")]
    EmptyQuery,

    #[error("SQL safety violation: {0}")]
    SQLSafetyViolation(String),

    #[error("Email already registered")]
    EmailTaken,

    // System errors 5xxx
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Vault encryption error: {0}")]
    VaultCrypto(String),

    // Database errors - auto-convert from sqlx::Error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Generic wrapper for other errors - auto-convert from anyhow::Error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn invalid_credentials() -> Self {
        Self::InvalidCredentials
    }

    pub fn target_connection_failed(message: impl Into<String>) -> Self {
        Self::TargetConnectionFailed { message: message.into() }
    }

    pub fn target_query_failed(message: impl Into<String>) -> Self {
        Self::TargetQueryFailed(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::ResourceNotFound(message.into())
    }

    pub fn profile_not_found(profile_id: i64) -> Self {
        Self::ProfileNotFound { profile_id }
    }

    pub fn sql_safety_violation(message: impl Into<String>) -> Self {
        Self::SQLSafetyViolation(message.into())
    }

    pub fn vault_crypto(message: impl Into<String>) -> Self {
        Self::VaultCrypto(message.into())
    }

    /// Stable numeric code, grouped by category
    pub fn error_code(&self) -> i32 {
        match self {
            // Authentication errors 1xxx
            Self::Unauthorized(_) => 1001,
            Self::TokenExpired => 1002,
            Self::InvalidCredentials => 1003,

            // Target database errors 2xxx
            Self::TargetConnectionFailed { .. } => 2001,
            Self::TargetQueryFailed(_) => 2002,
            Self::SshNotSupported => 2003,
            Self::TargetMissing => 2004,

            // Resource errors 3xxx
            Self::ResourceNotFound(_) => 3000,
            Self::ProfileNotFound { .. } => 3001,

            // Validation errors 4xxx
            Self::ValidationError(_) => 4001,
            Self::InvalidInput(_) => 4002,
            Self::EmptyQuery => 4003,
            Self::SQLSafetyViolation(_) => 4004,
            Self::EmailTaken => 4005,

            // System errors 5xxx
            Self::InternalError(_) => 5001,
            Self::Database(_) => 5002,
            Self::VaultCrypto(_) => 5003,
            Self::Other(_) => 5001,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Get localized error message based on current locale
    pub fn localized_message(&self) -> String {
        let locale = get_locale();
        match self {
            Self::Unauthorized(msg) => {
                if msg.contains("Missing authorization header") {
                    t!("auth.missing_header", locale = &locale).to_string()
                } else if msg.contains("Invalid authorization header") {
                    t!("auth.invalid_header", locale = &locale).to_string()
                } else if msg.contains("JWT verification failed") {
                    t!("auth.jwt_failed", locale = &locale).to_string()
                } else {
                    msg.clone()
                }
            },
            Self::TokenExpired => t!("auth.token_expired", locale = &locale).to_string(),
            Self::InvalidCredentials => t!("auth.invalid_credentials", locale = &locale).to_string(),
            Self::TargetConnectionFailed { message } => {
                t!("target.connection_failed", locale = &locale, message = message).to_string()
            },
            Self::TargetQueryFailed(message) => {
                t!("target.query_failed", locale = &locale, message = message).to_string()
            },
            Self::SshNotSupported => t!("target.ssh_not_supported", locale = &locale).to_string(),
            Self::TargetMissing => t!("target.missing", locale = &locale).to_string(),
            Self::ResourceNotFound(name) => {
                t!("resource.not_found", locale = &locale, name = name).to_string()
            },
            Self::ProfileNotFound { profile_id } => {
                t!("resource.profile_not_found", locale = &locale, id = profile_id).to_string()
            },
            Self::ValidationError(details) => {
                t!("validation.failed", locale = &locale, details = details).to_string()
            },
            Self::InvalidInput(msg) => msg.clone(),
            Self::EmptyQuery => t!("validation.empty_query", locale = &locale).to_string(),
            Self::SQLSafetyViolation(_) => t!("validation.select_only", locale = &locale).to_string(),
            Self::EmailTaken => t!("validation.email_taken", locale = &locale).to_string(),
            Self::InternalError(msg) => {
                t!("internal.error", locale = &locale, message = msg).to_string()
            },
            Self::VaultCrypto(_) => t!("vault.crypto_failed", locale = &locale).to_string(),
            Self::Database(err) => {
                t!("database.error", locale = &locale, error = err.to_string()).to_string()
            },
            Self::Other(err) => {
                t!("internal.error", locale = &locale, message = err.to_string()).to_string()
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let message = self.localized_message();

        let status = match code {
            1001..=1999 => StatusCode::UNAUTHORIZED,
            2001..=2999 => StatusCode::BAD_REQUEST,
            3000..=3999 => StatusCode::NOT_FOUND,
            4005 => StatusCode::CONFLICT,
            4001..=4999 => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", code, self);
        }

        let response = ApiErrorResponse { code, message, details: None };

        (status, Json(response)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal_error(format!("JSON serialization error: {}", err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::validation_error(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_by_category() {
        assert_eq!(ApiError::TokenExpired.error_code(), 1002);
        assert_eq!(ApiError::target_connection_failed("refused").error_code(), 2001);
        assert_eq!(ApiError::profile_not_found(7).error_code(), 3001);
        assert_eq!(ApiError::EmptyQuery.error_code(), 4003);
        assert_eq!(ApiError::vault_crypto("bad tag").error_code(), 5003);
    }

    #[test]
    fn test_status_mapping() {
        let status = |e: ApiError| e.into_response().status();
        assert_eq!(status(ApiError::invalid_credentials()), StatusCode::UNAUTHORIZED);
        assert_eq!(status(ApiError::SshNotSupported), StatusCode::BAD_REQUEST);
        assert_eq!(status(ApiError::not_found("User")), StatusCode::NOT_FOUND);
        assert_eq!(status(ApiError::EmailTaken), StatusCode::CONFLICT);
        assert_eq!(status(ApiError::sql_safety_violation("DROP")), StatusCode::BAD_REQUEST);
        assert_eq!(status(ApiError::internal_error("boom")), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_localized_messages_in_english() {
        assert_eq!(ApiError::EmptyQuery.localized_message(), "SQL query cannot be empty");
        assert_eq!(
            ApiError::sql_safety_violation("DELETE").localized_message(),
            "Only SELECT/CTE queries are allowed."
        );
    }
}
