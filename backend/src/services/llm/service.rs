use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::client::{AnthropicClient, LLMClient};
use super::json::extract_json_from_text;
use super::models::{CompletionRequest, LLMError, LLMScenario};
use super::scenarios::language::build_language_prompt_section;
use crate::config::LlmConfig;

/// A typed request for one scenario
pub trait LLMAnalysisRequestTrait: Send + Sync {
    fn scenario(&self) -> LLMScenario;

    /// Prompt with the request data filled in
    fn prompt(&self) -> String;

    fn max_tokens(&self) -> u32 {
        self.scenario().default_max_tokens()
    }
}

pub struct LLMService {
    client: Option<Arc<dyn LLMClient>>,
    enabled: bool,
    temperature: f32,
    max_tokens_cap: u32,
}

impl LLMService {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LLMError> {
        let client = match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => Some(Arc::new(AnthropicClient::new(
                config.api_base.clone(),
                key,
                config.model.clone(),
                config.anthropic_version.clone(),
                config.timeout_secs,
            )?) as Arc<dyn LLMClient>),
            None => None,
        };

        Ok(Self {
            client,
            enabled: config.enabled,
            temperature: config.temperature,
            max_tokens_cap: config.max_tokens,
        })
    }

    pub fn with_client(client: Arc<dyn LLMClient>, temperature: f32) -> Self {
        Self { client: Some(client), enabled: true, temperature, max_tokens_cap: u32::MAX }
    }

    pub fn is_available(&self) -> bool {
        self.enabled && self.client.is_some()
    }

    fn client(&self) -> Result<&Arc<dyn LLMClient>, LLMError> {
        if !self.enabled {
            return Err(LLMError::Disabled);
        }
        self.client.as_ref().ok_or(LLMError::NotConfigured)
    }

    /// Run one scenario and deserialize the scraped JSON into `Resp`
    pub async fn analyze<Req, Resp>(&self, req: &Req) -> Result<Resp, LLMError>
    where
        Req: LLMAnalysisRequestTrait,
        Resp: DeserializeOwned,
    {
        let client = self.client()?;
        let scenario = req.scenario();

        let mut prompt = req.prompt();
        prompt.push_str(&build_language_prompt_section());

        let request = CompletionRequest {
            prompt,
            max_tokens: req.max_tokens().min(self.max_tokens_cap),
            temperature: self.temperature,
        };

        let started = std::time::Instant::now();
        let text = client.complete(request).await.map_err(|e| {
            tracing::warn!("LLM {} failed: {}", scenario.as_str(), e);
            e
        })?;
        tracing::info!(
            "LLM {} completed in {}ms",
            scenario.as_str(),
            started.elapsed().as_millis()
        );

        let value = extract_json_from_text(&text).map_err(|e| {
            tracing::warn!("Failed to parse JSON from LLM output for {}: {}", scenario.as_str(), e);
            e
        })?;

        serde_json::from_value(value).map_err(|e| LLMError::ParseError {
            reason: format!("unexpected response shape: {}", e),
            raw_text: text,
        })
    }
}
