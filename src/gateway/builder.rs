//! Builder for configuring gateway instances.

use std::sync::Arc;
use std::time::Duration;

use super::Gateway;
use crate::providers::{
    GeminiAdapter, OpenAiCompatAdapter, ProviderAdapter, ProviderRegistry, RateLimit, RateLimiter,
    RetryPolicy,
};
use crate::types::{ModelConfig, ProviderId};
use crate::{Result, WayfinderError};

/// Default per-attempt HTTP timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Main entry point for creating gateway instances.
pub struct Wayfinder;

impl Wayfinder {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> WayfinderBuilder {
        WayfinderBuilder::new()
    }
}

/// Builder for configuring gateway instances.
///
/// ```rust,no_run
/// use wayfinder::{Wayfinder, ProviderId};
///
/// # fn main() -> wayfinder::Result<()> {
/// let gateway = Wayfinder::builder()
///     .gemini("your-gemini-key")
///     .deepseek("your-deepseek-key")
///     .default_provider(ProviderId::Gemini)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct WayfinderBuilder {
    gemini_key: Option<String>,
    openai_key: Option<String>,
    deepseek_key: Option<String>,
    openrouter_key: Option<String>,
    default_provider: Option<ProviderId>,
    timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    rate_limits: Vec<(ProviderId, RateLimit)>,
    custom_adapters: Vec<(ProviderId, Arc<dyn ProviderAdapter>, Option<ModelConfig>)>,
}

impl WayfinderBuilder {
    pub fn new() -> Self {
        Self {
            gemini_key: None,
            openai_key: None,
            deepseek_key: None,
            openrouter_key: None,
            default_provider: None,
            timeout: None,
            retry: None,
            rate_limits: Vec::new(),
            custom_adapters: Vec::new(),
        }
    }

    /// Configure the Google Gemini provider.
    pub fn gemini(mut self, api_key: impl Into<String>) -> Self {
        self.gemini_key = Some(api_key.into());
        self
    }

    /// Configure the OpenAI provider.
    pub fn openai(mut self, api_key: impl Into<String>) -> Self {
        self.openai_key = Some(api_key.into());
        self
    }

    /// Configure the DeepSeek provider.
    pub fn deepseek(mut self, api_key: impl Into<String>) -> Self {
        self.deepseek_key = Some(api_key.into());
        self
    }

    /// Configure Gemini models via the OpenRouter aggregator.
    pub fn gemini_via_openrouter(mut self, api_key: impl Into<String>) -> Self {
        self.openrouter_key = Some(api_key.into());
        self
    }

    /// Register a custom adapter under a provider id, with its default
    /// model configuration. Replaces any key-based adapter for that id.
    /// Useful for tests and self-hosted endpoints.
    pub fn adapter(mut self, provider: ProviderId, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.custom_adapters.push((provider, adapter, None));
        self
    }

    /// Register a custom adapter with an explicit default configuration.
    pub fn adapter_with_config(
        mut self,
        provider: ProviderId,
        adapter: Arc<dyn ProviderAdapter>,
        config: ModelConfig,
    ) -> Self {
        self.custom_adapters.push((provider, adapter, Some(config)));
        self
    }

    /// Set the provider used when a call carries no override.
    ///
    /// Defaults to the first configured provider in priority order.
    pub fn default_provider(mut self, provider: ProviderId) -> Self {
        self.default_provider = Some(provider);
        self
    }

    /// Set the default per-attempt HTTP timeout (default: 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the default retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Override the pacing limits for one provider.
    pub fn rate_limit(mut self, provider: ProviderId, limit: RateLimit) -> Self {
        self.rate_limits.push((provider, limit));
        self
    }

    /// Build the gateway.
    pub fn build(self) -> Result<Gateway> {
        let mut registry = ProviderRegistry::new();
        let http = reqwest::Client::new();

        if let Some(ref key) = self.gemini_key {
            registry.add(
                ProviderId::Gemini,
                Arc::new(GeminiAdapter::new(key.clone(), http.clone())),
                ModelConfig::default_for(ProviderId::Gemini),
            );
        }
        if let Some(ref key) = self.openai_key {
            registry.add(
                ProviderId::Openai,
                Arc::new(OpenAiCompatAdapter::openai(key.clone(), http.clone())),
                ModelConfig::default_for(ProviderId::Openai),
            );
        }
        if let Some(ref key) = self.deepseek_key {
            registry.add(
                ProviderId::Deepseek,
                Arc::new(OpenAiCompatAdapter::deepseek(key.clone(), http.clone())),
                ModelConfig::default_for(ProviderId::Deepseek),
            );
        }
        if let Some(ref key) = self.openrouter_key {
            registry.add(
                ProviderId::GeminiViaOpenrouter,
                Arc::new(OpenAiCompatAdapter::gemini_via_openrouter(
                    key.clone(),
                    http.clone(),
                )),
                ModelConfig::default_for(ProviderId::GeminiViaOpenrouter),
            );
        }
        for (provider, adapter, config) in self.custom_adapters {
            let config = config.unwrap_or_else(|| ModelConfig::default_for(provider));
            registry.add(provider, adapter, config);
        }

        if registry.is_empty() {
            return Err(WayfinderError::NoProvider);
        }

        let default_provider = match self.default_provider {
            Some(provider) => {
                // Fail at build time rather than on every call.
                registry.default_config(provider)?;
                provider
            }
            None => registry.available_providers()[0],
        };

        let mut rate_limiter = RateLimiter::new();
        for (provider, limit) in self.rate_limits {
            rate_limiter = rate_limiter.with_limit(provider, limit);
        }

        Ok(Gateway::new(
            registry,
            default_provider,
            rate_limiter,
            self.retry.unwrap_or_default(),
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        ))
    }
}

impl Default for WayfinderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
