//! Per-provider pacing and concurrency control.
//!
//! Each provider gets a gate combining a minimum inter-request delay and a
//! maximum concurrent in-flight count. [`RateLimiter::acquire()`] fails fast
//! with `RateLimitExceeded` when the concurrency ceiling is hit (callers are
//! never queued) and otherwise suspends until the provider's next dispatch
//! slot. The returned [`RateLimitPermit`] releases the slot on drop, so
//! success, failure, and timeout all release exactly once.
//!
//! Dispatch slots are reserved while the state lock is held: the caller's
//! start instant is fixed before it sleeps towards it, so concurrent
//! acquirers to one provider are serialised at least `min_delay` apart. The
//! lock is a plain `std::sync::Mutex` and is never held across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::telemetry;
use crate::types::ProviderId;
use crate::{Result, WayfinderError};

/// Pacing limits for one provider.
///
/// Backends with stricter quotas get a larger delay and lower concurrency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Minimum spacing between consecutive dispatches to this provider.
    pub min_delay: Duration,
    /// Maximum concurrent in-flight calls to this provider.
    pub max_concurrent: u32,
}

impl RateLimit {
    pub fn new(min_delay: Duration, max_concurrent: u32) -> Self {
        Self {
            min_delay,
            max_concurrent,
        }
    }

    /// The default limits for a provider.
    pub fn default_for(provider: ProviderId) -> Self {
        match provider {
            ProviderId::Gemini => Self::new(Duration::from_millis(2000), 1),
            ProviderId::Openai => Self::new(Duration::from_millis(500), 3),
            ProviderId::Deepseek => Self::new(Duration::from_millis(1000), 2),
            ProviderId::GeminiViaOpenrouter => Self::new(Duration::from_millis(500), 3),
        }
    }
}

#[derive(Default)]
struct ProviderState {
    /// Scheduled start instant of the most recently admitted call.
    last_scheduled: Option<Instant>,
    /// Calls currently in flight (admitted, permit not yet dropped).
    active: u32,
}

/// Per-provider rate limiter shared by all calls through one gateway.
pub struct RateLimiter {
    limits: HashMap<ProviderId, RateLimit>,
    states: Mutex<HashMap<ProviderId, ProviderState>>,
}

impl RateLimiter {
    /// Create a limiter with the default per-provider limits.
    pub fn new() -> Self {
        Self {
            limits: ProviderId::ALL
                .into_iter()
                .map(|p| (p, RateLimit::default_for(p)))
                .collect(),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Override the limits for one provider.
    pub fn with_limit(mut self, provider: ProviderId, limit: RateLimit) -> Self {
        self.limits.insert(provider, limit);
        self
    }

    /// The configured limits for a provider.
    pub fn limit(&self, provider: ProviderId) -> RateLimit {
        self.limits
            .get(&provider)
            .copied()
            .unwrap_or_else(|| RateLimit::default_for(provider))
    }

    /// Calls currently in flight for a provider.
    pub fn active(&self, provider: ProviderId) -> u32 {
        self.lock_states()
            .get(&provider)
            .map_or(0, |state| state.active)
    }

    /// Acquire a dispatch slot for `provider`.
    ///
    /// Fails immediately with `RateLimitExceeded` at the concurrency
    /// ceiling. Otherwise reserves the next dispatch slot, suspends until it
    /// arrives, and returns a permit that releases the slot on drop.
    ///
    /// The permit is constructed in the same lock scope that reserves the
    /// slot, before the pacing sleep: a caller dropped mid-sleep releases
    /// the slot through the permit's `Drop` instead of leaking it.
    pub async fn acquire(self: &Arc<Self>, provider: ProviderId) -> Result<RateLimitPermit> {
        let limit = self.limit(provider);
        let (permit, start_at) = {
            let mut states = self.lock_states();
            let state = states.entry(provider).or_default();
            if state.active >= limit.max_concurrent {
                metrics::counter!(telemetry::RATE_LIMIT_REJECTIONS_TOTAL,
                    "provider" => provider.as_str(),
                )
                .increment(1);
                return Err(WayfinderError::RateLimitExceeded(provider));
            }
            let now = Instant::now();
            let start_at = match state.last_scheduled {
                Some(prev) => (prev + limit.min_delay).max(now),
                None => now,
            };
            state.last_scheduled = Some(start_at);
            state.active += 1;
            let permit = RateLimitPermit {
                limiter: Arc::clone(self),
                provider,
            };
            (permit, start_at)
        };

        let wait = start_at.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            debug!(
                provider = provider.as_str(),
                wait_ms = wait.as_millis() as u64,
                "pacing delay before dispatch"
            );
            tokio::time::sleep_until(start_at).await;
        }

        Ok(permit)
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<ProviderId, ProviderState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, provider: ProviderId) {
        let mut states = self.lock_states();
        if let Some(state) = states.get_mut(&provider) {
            state.active = state.active.saturating_sub(1);
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// An acquired dispatch slot. Dropping it releases the slot.
pub struct RateLimitPermit {
    limiter: Arc<RateLimiter>,
    provider: ProviderId,
}

impl Drop for RateLimitPermit {
    fn drop(&mut self) {
        self.limiter.release(self.provider);
    }
}
