//! Provider identifiers and per-provider model configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, WayfinderError};

/// One upstream LLM backend (distinct vendor/API surface).
///
/// Used as the key for all per-provider state: adapters, default model
/// configuration, and rate-limiter counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    Gemini,
    Openai,
    Deepseek,
    /// Gemini models reached through the OpenRouter aggregator.
    #[serde(rename = "gemini-via-openrouter")]
    GeminiViaOpenrouter,
}

impl ProviderId {
    /// All known providers, in default-selection priority order.
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Gemini,
        ProviderId::Openai,
        ProviderId::Deepseek,
        ProviderId::GeminiViaOpenrouter,
    ];

    /// Stable string form, used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::Openai => "openai",
            ProviderId::Deepseek => "deepseek",
            ProviderId::GeminiViaOpenrouter => "gemini-via-openrouter",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = WayfinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gemini" => Ok(ProviderId::Gemini),
            "openai" => Ok(ProviderId::Openai),
            "deepseek" => Ok(ProviderId::Deepseek),
            "gemini-via-openrouter" => Ok(ProviderId::GeminiViaOpenrouter),
            other => Err(WayfinderError::UnknownProvider(other.to_string())),
        }
    }
}

/// Model parameters for a single provider call.
///
/// One default per provider; callers may override individual fields per call
/// through [`GenerateOptions`](crate::GenerateOptions). Plain value type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: ProviderId,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ModelConfig {
    /// The default model configuration for a provider.
    pub fn default_for(provider: ProviderId) -> Self {
        let model = match provider {
            ProviderId::Gemini => "gemini-2.0-flash",
            ProviderId::Openai => "gpt-4o-mini",
            ProviderId::Deepseek => "deepseek-chat",
            ProviderId::GeminiViaOpenrouter => "google/gemini-2.0-flash-001",
        };
        Self {
            provider,
            model: model.to_string(),
            temperature: 0.7,
            max_tokens: 2048,
        }
    }

    /// Override the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the completion token limit.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
