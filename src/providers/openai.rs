//! OpenAI-compatible chat completions adapter.
//!
//! One adapter covers every backend speaking the `/chat/completions` wire
//! format: OpenAI itself, DeepSeek, and Gemini models via OpenRouter. The
//! instances differ only in base URL, credentials, reported name, and the
//! odd model quirk.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{classify_status, classify_transport_error, parse_retry_after};
use crate::types::{Message, ModelConfig, Role};
use crate::{ProviderAdapter, Result, WayfinderError};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// DeepSeek's reasoner model rejects any non-default temperature, so the
/// parameter is omitted from the request entirely.
const DEEPSEEK_REASONER: &str = "deepseek-reasoner";

/// Adapter for OpenAI-compatible chat completion APIs.
pub struct OpenAiCompatAdapter {
    name: &'static str,
    api_key: String,
    http: Client,
    base_url: String,
    /// Model name for which `temperature` must be left out of the request.
    omit_temperature_for: Option<&'static str>,
}

impl OpenAiCompatAdapter {
    /// Adapter for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, http: Client) -> Self {
        Self::with_base_url("openai", api_key, http, OPENAI_BASE_URL)
    }

    /// Adapter for the DeepSeek API (OpenAI-compatible).
    pub fn deepseek(api_key: impl Into<String>, http: Client) -> Self {
        let mut adapter = Self::with_base_url("deepseek", api_key, http, DEEPSEEK_BASE_URL);
        adapter.omit_temperature_for = Some(DEEPSEEK_REASONER);
        adapter
    }

    /// Adapter for Gemini models served through OpenRouter.
    pub fn gemini_via_openrouter(api_key: impl Into<String>, http: Client) -> Self {
        Self::with_base_url("gemini-via-openrouter", api_key, http, OPENROUTER_BASE_URL)
    }

    /// Create an adapter with a custom base URL (for testing with wiremock).
    pub fn with_base_url(
        name: &'static str,
        api_key: impl Into<String>,
        http: Client,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name,
            api_key: api_key.into(),
            http,
            base_url: base_url.into(),
            omit_temperature_for: None,
        }
    }

    /// Leave `temperature` out of requests for the given model.
    pub fn omit_temperature_for(mut self, model: &'static str) -> Self {
        self.omit_temperature_for = Some(model);
        self
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatAdapter {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(
        &self,
        prompt: &str,
        history: &[Message],
        system_prompt: Option<&str>,
        config: &ModelConfig,
        timeout: Duration,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        for m in history {
            messages.push(ChatMessage {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &m.content,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let temperature = if self.omit_temperature_for == Some(config.model.as_str()) {
            None
        } else {
            Some(config.temperature)
        };

        let body = ChatCompletionRequest {
            model: &config.model,
            messages,
            temperature,
            max_tokens: config.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(&response);
            let message = error_message(&response.text().await.unwrap_or_default());
            return Err(classify_status(status, retry_after, message));
        }

        let reply: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| WayfinderError::MalformedResponse(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .find_map(|c| c.message.content.filter(|t| !t.is_empty()))
            .ok_or(WayfinderError::EmptyResponse)
    }
}

/// Best-effort extraction of `error.message` from an OpenAI-style error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
