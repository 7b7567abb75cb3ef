//! Google Gemini adapter — native `generateContent` REST API.
//!
//! See: <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{classify_status, classify_transport_error, parse_retry_after};
use crate::types::{Message, ModelConfig, Role};
use crate::{ProviderAdapter, Result, WayfinderError};

/// Default base URL for the Gemini API.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Adapter for Google's Gemini `generateContent` endpoint.
///
/// Gemini has its own wire format: turns are `contents` with `user`/`model`
/// roles, the system prompt travels as a separate `systemInstruction`, and
/// the API key rides in a query parameter rather than a header.
pub struct GeminiAdapter {
    api_key: String,
    http: Client,
    base_url: String,
}

impl GeminiAdapter {
    /// Create a new Gemini adapter sharing the given HTTP client.
    pub fn new(api_key: impl Into<String>, http: Client) -> Self {
        Self::with_base_url(api_key, http, DEFAULT_BASE_URL)
    }

    /// Create an adapter with a custom base URL (for testing with wiremock).
    pub fn with_base_url(
        api_key: impl Into<String>,
        http: Client,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn send(
        &self,
        prompt: &str,
        history: &[Message],
        system_prompt: Option<&str>,
        config: &ModelConfig,
        timeout: Duration,
    ) -> Result<String> {
        let mut contents: Vec<Content<'_>> = history
            .iter()
            .map(|m| Content {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                },
                parts: vec![Part { text: &m.content }],
            })
            .collect();
        contents.push(Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        });

        let body = GenerateContentRequest {
            contents,
            system_instruction: system_prompt.map(|text| SystemInstruction {
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, config.model, self.api_key
        );

        let response = self
            .http
            .post(&url)
            .timeout(timeout)
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

        let reply: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| WayfinderError::MalformedResponse(e.to_string()))?;

        reply
            .candidates
            .into_iter()
            .flat_map(|c| c.content.map(|c| c.parts).unwrap_or_default())
            .find_map(|p| p.text.filter(|t| !t.is_empty()))
            .ok_or(WayfinderError::EmptyResponse)
    }
}

/// Best-effort extraction of `error.message` from a Gemini error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
