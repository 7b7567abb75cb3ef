//! Provider registry: adapters and default model configuration by id.
//!
//! Dispatch is a lookup on [`ProviderId`], not a branch: adding a backend
//! means registering another [`ProviderAdapter`] implementation. The
//! registry is read-only after the gateway is built.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{ModelConfig, ProviderId};
use crate::{ProviderAdapter, Result, WayfinderError};

/// Registry of configured providers.
///
/// A provider is "available" when credentials were supplied for it at build
/// time and an adapter was registered. Lookups for anything else fail with
/// `UnconfiguredProvider`.
#[derive(Default)]
pub struct ProviderRegistry {
    adapters: HashMap<ProviderId, Arc<dyn ProviderAdapter>>,
    configs: HashMap<ProviderId, ModelConfig>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter with its default model configuration.
    pub fn add(
        &mut self,
        provider: ProviderId,
        adapter: Arc<dyn ProviderAdapter>,
        config: ModelConfig,
    ) {
        self.adapters.insert(provider, adapter);
        self.configs.insert(provider, config);
    }

    /// Providers with valid credentials, in priority order.
    pub fn available_providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }

    /// Whether any provider is configured.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// The default model configuration for a provider.
    pub fn default_config(&self, provider: ProviderId) -> Result<&ModelConfig> {
        self.configs
            .get(&provider)
            .ok_or(WayfinderError::UnconfiguredProvider(provider))
    }

    /// The adapter for a provider.
    pub fn adapter(&self, provider: ProviderId) -> Result<Arc<dyn ProviderAdapter>> {
        self.adapters
            .get(&provider)
            .cloned()
            .ok_or(WayfinderError::UnconfiguredProvider(provider))
    }
}
