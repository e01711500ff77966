use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::models::TargetConnection;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub vault: VaultConfig,
    pub llm: LlmConfig,
    pub analysis: AnalysisConfig,
    /// Default target used when a request names neither a connection nor a profile
    pub target: Option<TargetConnection>,
    pub logging: LoggingConfig,
    pub static_config: StaticConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Token lifetime in seconds (accepts "30m", "24h", "7d")
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub jwt_expires_in: u64,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub secret: String,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub anthropic_version: String,
    /// Upper bound applied to every scenario's own token budget
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sample_limit: u32,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub enabled: bool,
    pub web_root: String,
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from the given path, or the first config.toml found
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load(path: Option<&str>) -> Result<Self, anyhow::Error> {
        // 1. Load from config file
        let mut config = match path.map(str::to_string).or_else(Self::find_config_file) {
            Some(config_path) => Self::from_toml(&config_path)?,
            None => {
                tracing::warn!("Configuration file not found, using defaults");
                Config::default()
            },
        };

        // 2. Override with environment variables
        config.apply_env_overrides();

        // 3. Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_DATABASE_URL: Application database URL (default: sqlite://data/queryvault.db)
    /// - APP_JWT_SECRET / APP_JWT_EXPIRES_IN (e.g., "24h")
    /// - APP_VAULT_SECRET: Secret the vault encryption keys are derived from
    /// - APP_LLM_ENABLED / APP_LLM_MODEL / APP_LLM_API_BASE
    /// - APP_LLM_API_KEY, falling back to ANTHROPIC_API_KEY
    /// - APP_ANALYSIS_SAMPLE_LIMIT
    /// - DB_HOST / DB_PORT / DB_USER / DB_PASS / DB_NAME: default target database
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,queryvault=debug")
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(db_url) = std::env::var("APP_DATABASE_URL") {
            self.database.url = db_url;
            tracing::info!("Override database.url from env");
        }

        if let Ok(secret) = std::env::var("APP_JWT_SECRET") {
            self.auth.jwt_secret = secret;
            tracing::info!("Override auth.jwt_secret from env");
        }

        if let Ok(expires) = std::env::var("APP_JWT_EXPIRES_IN") {
            match parse_duration_to_secs(&expires) {
                Ok(val) => {
                    self.auth.jwt_expires_in = val;
                    tracing::info!("Override auth.jwt_expires_in from env: {}s", val);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_JWT_EXPIRES_IN '{}': {} (keep {}s)",
                    expires,
                    e,
                    self.auth.jwt_expires_in
                ),
            }
        }

        if let Ok(secret) = std::env::var("APP_VAULT_SECRET") {
            self.vault.secret = secret;
            tracing::info!("Override vault.secret from env");
        }

        if let Ok(enabled) = std::env::var("APP_LLM_ENABLED")
            && let Ok(val) = enabled.parse()
        {
            self.llm.enabled = val;
            tracing::info!("Override llm.enabled from env: {}", self.llm.enabled);
        }

        if let Ok(model) = std::env::var("APP_LLM_MODEL") {
            self.llm.model = model;
            tracing::info!("Override llm.model from env: {}", self.llm.model);
        }

        if let Ok(base) = std::env::var("APP_LLM_API_BASE") {
            self.llm.api_base = base;
            tracing::info!("Override llm.api_base from env: {}", self.llm.api_base);
        }

        if let Ok(key) = std::env::var("APP_LLM_API_KEY").or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
            && !key.trim().is_empty()
        {
            self.llm.api_key = Some(key);
            tracing::info!("Override llm.api_key from env");
        }

        if let Ok(limit) = std::env::var("APP_ANALYSIS_SAMPLE_LIMIT")
            && let Ok(limit) = limit.parse()
        {
            self.analysis.sample_limit = limit;
            tracing::info!("Override analysis.sample_limit from env: {}", limit);
        }

        if let Some(target) = target_from_env(|name| std::env::var(name).ok()) {
            tracing::info!(
                "Default target from env: {}@{}:{}/{}",
                target.user,
                target.host,
                target.port,
                target.database
            );
            self.target = Some(target);
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.auth.jwt_secret == "dev-secret-key-change-in-production" {
            tracing::warn!("⚠️  WARNING: Using default JWT secret!");
            tracing::warn!("⚠️  Please set APP_JWT_SECRET or update config.toml");
        }

        if self.vault.secret == DEFAULT_VAULT_SECRET {
            tracing::warn!("⚠️  WARNING: Using default vault secret!");
            tracing::warn!("⚠️  Please set APP_VAULT_SECRET or update config.toml");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.auth.jwt_expires_in == 0 {
            anyhow::bail!("auth.jwt_expires_in must be > 0");
        }

        if self.vault.secret.is_empty() {
            anyhow::bail!("vault.secret cannot be empty");
        }

        if self.analysis.sample_limit == 0 {
            anyhow::bail!("analysis.sample_limit must be > 0");
        }

        if !(0.0..=1.0).contains(&self.llm.temperature) {
            anyhow::bail!("llm.temperature must be within 0.0..=1.0");
        }

        if self.llm.enabled && self.llm.api_key.as_deref().is_none_or(str::is_empty) {
            tracing::warn!("LLM is enabled but no API key is set; advisors will report errors");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Build the default target from `DB_*` variables; `DB_HOST` must be present.
fn target_from_env(var: impl Fn(&str) -> Option<String>) -> Option<TargetConnection> {
    let host = var("DB_HOST").filter(|h| !h.trim().is_empty())?;
    Some(TargetConnection {
        host,
        port: var("DB_PORT").and_then(|p| p.parse().ok()).unwrap_or(3306),
        user: var("DB_USER").unwrap_or_else(|| "root".to_string()),
        password: var("DB_PASS").unwrap_or_default(),
        database: var("DB_NAME").unwrap_or_default(),
        use_ssh: false,
        ssh_config: None,
    })
}

const DEFAULT_VAULT_SECRET: &str = "dev-vault-secret-change-in-production";

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://data/queryvault.db".to_string() }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-key-change-in-production".to_string(),
            jwt_expires_in: 24 * 60 * 60,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { secret: DEFAULT_VAULT_SECRET.to_string() }
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig").field("secret", &"***").finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: "https://api.anthropic.com/v1/messages".to_string(),
            api_key: None,
            model: "claude-3-5-sonnet-latest".to_string(),
            anthropic_version: "2023-06-01".to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("enabled", &self.enabled)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("anthropic_version", &self.anthropic_version)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { sample_limit: 5, connect_timeout_secs: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,queryvault=debug".to_string(),
            file: Some("logs/queryvault.log".to_string()),
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self { enabled: false, web_root: "web".to_string() }
    }
}

// =========================
// Helpers for parsing values
// =========================

pub fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Ok(n),
        "m" | "min" | "mins" | "minute" | "minutes" => Ok(n * 60),
        "h" | "hr" | "hour" | "hours" => Ok(n * 60 * 60),
        "d" | "day" | "days" => Ok(n * 60 * 60 * 24),
        _ => Err(format!("unsupported unit: {}", unit)),
    }
}

// Custom serde deserializer to support numeric or human-friendly string values
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '5m', '1h'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}
