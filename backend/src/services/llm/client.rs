//! LLM HTTP client
//!
//! `LLMClient` is the seam between prompt construction and the provider.
//! `AnthropicClient` talks to the Anthropic Messages API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::models::{CompletionRequest, LLMError};

#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Send one user prompt and return the concatenated text output
    async fn complete(&self, request: CompletionRequest) -> Result<String, LLMError>;
}

pub struct AnthropicClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    anthropic_version: String,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        anthropic_version: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, LLMError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LLMError::Request(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
            anthropic_version: anthropic_version.into(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl LLMClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LLMError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![Message { role: "user", content: &request.prompt }],
        };

        tracing::debug!(
            "LLM request: model={}, max_tokens={}, prompt_len={}",
            self.model,
            request.max_tokens,
            request.prompt.len()
        );

        let response = self
            .http
            .post(&self.api_base)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.anthropic_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout(self.timeout_secs)
                } else {
                    LLMError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            return Err(LLMError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("LLM API returned {}: {}", status, text);
            return Err(LLMError::ApiError(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ApiError(format!("invalid response body: {}", e)))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();

        tracing::debug!("LLM response: {} chars", text.len());
        Ok(text)
    }
}
