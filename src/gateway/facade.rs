//! The gateway facade: cache → dedup → rate limit → retry → adapter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cache::{InFlight, ResponseCache, DEFAULT_CACHE_TTL};
use crate::providers::retry::{with_retry, RetryPolicy};
use crate::providers::{ProviderAdapter, ProviderRegistry, RateLimiter};
use crate::telemetry;
use crate::types::{GenerateOptions, GenerateResponse, Message, ModelConfig, ProviderId};
use crate::{Result, WayfinderError};

/// The AI provider gateway.
///
/// One reliable `generate()` call on top of several heterogeneous,
/// rate-limited upstream APIs. All shared state — response cache, in-flight
/// registry, rate-limiter counters — lives on the instance, so independent
/// gateways (e.g. per-tenant limits) don't interfere.
///
/// Built via [`Wayfinder::builder()`](crate::Wayfinder::builder).
pub struct Gateway {
    registry: ProviderRegistry,
    default_provider: ProviderId,
    rate_limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    timeout: Duration,
    cache: Arc<ResponseCache>,
    in_flight: InFlight,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("default_provider", &self.default_provider)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    pub(crate) fn new(
        registry: ProviderRegistry,
        default_provider: ProviderId,
        rate_limiter: RateLimiter,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            default_provider,
            rate_limiter: Arc::new(rate_limiter),
            retry,
            timeout,
            cache: Arc::new(ResponseCache::new()),
            in_flight: InFlight::new(),
        }
    }

    /// Providers with valid credentials, in priority order.
    pub fn available_providers(&self) -> Vec<ProviderId> {
        self.registry.available_providers()
    }

    /// The provider used when a call carries no override.
    pub fn default_provider(&self) -> ProviderId {
        self.default_provider
    }

    /// Generate a completion for `prompt`.
    ///
    /// Cache lookup first (a live entry short-circuits everything), then —
    /// when a cache key is present — coalescing with identical in-flight
    /// calls, then the retry loop around rate-limited provider attempts.
    /// Successful responses are cached under the caller's key; failures are
    /// propagated classified, never replaced with fallback text.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<GenerateResponse> {
        if let Some(key) = options.cache_key.as_deref() {
            if let Some(hit) = self.cache.get(key).await {
                debug!(cache_key = key, provider = hit.provider.as_str(), "cache hit");
                return Ok(hit);
            }
        }

        let provider = options.provider.unwrap_or(self.default_provider);
        let mut config = self.registry.default_config(provider)?.clone();
        if let Some(model) = &options.model {
            config.model = model.clone();
        }
        if let Some(temperature) = options.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = options.max_tokens {
            config.max_tokens = max_tokens;
        }

        let call = PreparedCall {
            adapter: self.registry.adapter(provider)?,
            rate_limiter: Arc::clone(&self.rate_limiter),
            provider,
            prompt: prompt.to_string(),
            history: options.history.clone(),
            system_prompt: options.system_prompt.clone(),
            config,
            policy: options.retry.clone().unwrap_or_else(|| self.retry.clone()),
            timeout: options.timeout.unwrap_or(self.timeout),
            cache_store: options.cache_key.as_ref().map(|key| CacheStore {
                cache: Arc::clone(&self.cache),
                key: key.clone(),
                ttl: options.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL),
            }),
        };

        match &options.cache_key {
            Some(key) => self.in_flight.join_or_start(key, call.run()).await,
            None => call.run().await,
        }
    }

    /// Convenience wrapper returning just the generated text.
    pub async fn generate_text(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        self.generate(prompt, options).await.map(|r| r.text)
    }
}

struct CacheStore {
    cache: Arc<ResponseCache>,
    key: String,
    ttl: Duration,
}

/// A fully resolved call, detached from the gateway so it can run as a
/// shared in-flight future.
struct PreparedCall {
    adapter: Arc<dyn ProviderAdapter>,
    rate_limiter: Arc<RateLimiter>,
    provider: ProviderId,
    prompt: String,
    history: Vec<Message>,
    system_prompt: Option<String>,
    config: ModelConfig,
    policy: RetryPolicy,
    timeout: Duration,
    cache_store: Option<CacheStore>,
}

impl PreparedCall {
    async fn run(self) -> Result<GenerateResponse> {
        let started = Instant::now();
        let cache_key = self.cache_store.as_ref().map(|s| s.key.clone());

        // The permit wraps each individual attempt, not the whole loop, so
        // a provider slot is never held across a backoff sleep.
        let result = with_retry(&self.policy, self.provider, &self.config.model, || async {
            let _permit = self.rate_limiter.acquire(self.provider).await?;
            self.adapter
                .send(
                    &self.prompt,
                    &self.history,
                    self.system_prompt.as_deref(),
                    &self.config,
                    self.timeout,
                )
                .await
        })
        .await;

        let duration_ms = started.elapsed().as_millis() as u64;
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => self.provider.as_str(),
            "status" => if result.is_ok() { "ok" } else { "error" },
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => self.provider.as_str(),
        )
        .record(started.elapsed().as_secs_f64());

        match result {
            Ok(text) => {
                let response = GenerateResponse {
                    text,
                    provider: self.provider,
                    model: self.config.model.clone(),
                };
                if let Some(store) = &self.cache_store {
                    store
                        .cache
                        .insert(store.key.clone(), response.clone(), store.ttl)
                        .await;
                }
                debug!(
                    provider = self.provider.as_str(),
                    model = %self.config.model,
                    cache_key = cache_key.as_deref(),
                    duration_ms,
                    "generation succeeded"
                );
                Ok(response)
            }
            Err(e) => {
                warn!(
                    provider = self.provider.as_str(),
                    model = %self.config.model,
                    cache_key = cache_key.as_deref(),
                    duration_ms,
                    error = %e,
                    "generation failed"
                );
                // Exhausted retries get wrapped; fatal errors keep their
                // classification unchanged.
                if e.is_retryable(&self.policy.retryable_status_codes) {
                    Err(WayfinderError::GenerationFailed {
                        attempts: self.policy.max_attempts(),
                        cause: Box::new(e),
                    })
                } else {
                    Err(e)
                }
            }
        }
    }
}
