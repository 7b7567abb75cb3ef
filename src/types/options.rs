//! Per-call generation options.

use std::time::Duration;

use crate::providers::retry::RetryPolicy;
use crate::types::{Message, ProviderId};

/// Options for a single [`Gateway::generate`](crate::Gateway::generate) call.
///
/// Constructed fresh per call and never mutated afterwards. Everything is
/// optional: an empty `GenerateOptions::default()` sends the bare prompt to
/// the gateway's default provider with its default model configuration.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Provider override; falls back to the gateway default.
    pub provider: Option<ProviderId>,
    /// System prompt, sent as the first turn where the wire format allows.
    pub system_prompt: Option<String>,
    /// Prior conversation turns, oldest first.
    pub history: Vec<Message>,
    /// Model name override for this call.
    pub model: Option<String>,
    /// Temperature override for this call.
    pub temperature: Option<f32>,
    /// Completion token limit override for this call.
    pub max_tokens: Option<u32>,
    /// Per-attempt HTTP timeout; falls back to the gateway default (30s).
    pub timeout: Option<Duration>,
    /// Retry policy override; falls back to the gateway default.
    pub retry: Option<RetryPolicy>,
    /// Opt-in cache/dedup key. Calls without one are never cached or
    /// coalesced.
    pub cache_key: Option<String>,
    /// TTL for the cached response; only meaningful with `cache_key`.
    pub cache_ttl: Option<Duration>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}
