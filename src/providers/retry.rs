//! Retry policy, backoff calculation, and the shared retry loop.
//!
//! [`with_retry()`] wraps one logical provider call in an attempt loop:
//! classify the failure, back off exponentially with jitter, give up after a
//! bounded number of attempts. Attempts for one logical call are strictly
//! sequential. The rate-limiter permit is acquired inside each attempt, not
//! around the loop, so a provider slot is never held across a backoff sleep.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::telemetry;
use crate::types::ProviderId;
use crate::{Result, WayfinderError};

/// Fraction of random jitter added on top of each computed backoff delay.
///
/// 0–10% is enough to desynchronise retrying clients without materially
/// stretching the schedule.
const JITTER_FRACTION: f64 = 0.1;

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff with jitter. Retryability is decided from the
/// error's HTTP status (against `retryable_status_codes`) or its network
/// class (timeout, connection reset).
///
/// ```rust
/// # use wayfinder::RetryPolicy;
/// # use std::time::Duration;
/// let policy = RetryPolicy::new()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt. 0 = single attempt. Default: 3.
    pub max_retries: u32,
    /// Delay before the first retry. Default: 1s.
    pub base_delay: Duration,
    /// Cap on the exponential growth. Default: 30s.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays. Default: 2.0.
    pub backoff_multiplier: f64,
    /// HTTP statuses worth retrying. Default: {429, 502, 503, 504, 408}.
    pub retryable_status_codes: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            retryable_status_codes: [429, 502, 503, 504, 408].into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the number of retries after the initial attempt.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the cap on exponential growth.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the growth factor between consecutive delays.
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Replace the set of retryable HTTP status codes.
    pub fn retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = codes.into_iter().collect();
        self
    }

    /// Total attempts for one logical call (initial request + retries).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Backoff delay for a given attempt number (1-indexed), without jitter.
    ///
    /// `base_delay * backoff_multiplier^(attempt-1)`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exp);
        Duration::from_secs_f64(secs).min(self.max_delay)
    }

    /// The delay actually slept before retrying `attempt`.
    ///
    /// An upstream `Retry-After` hint takes precedence over the computed
    /// backoff; otherwise jitter is added before applying the cap.
    fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint.min(self.max_delay);
        }
        let exp = attempt.saturating_sub(1) as i32;
        let jitter = 1.0 + rand::random::<f64>() * JITTER_FRACTION;
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exp) * jitter;
        Duration::from_secs_f64(secs).min(self.max_delay)
    }
}

/// Execute one logical provider call with retry.
///
/// Retries on retryable errors (per [`WayfinderError::is_retryable()`]) up to
/// `policy.max_attempts()` total attempts. Fatal errors are returned
/// immediately without retry; after exhaustion the last error is surfaced
/// unchanged for the caller to wrap.
pub(crate) async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    provider: ProviderId,
    model: &str,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 1..=policy.max_attempts() {
        debug!(
            provider = provider.as_str(),
            model,
            attempt,
            max_attempts = policy.max_attempts(),
            "dispatching generation attempt"
        );
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable(&policy.retryable_status_codes) => {
                if attempt < policy.max_attempts() {
                    metrics::counter!(telemetry::RETRIES_TOTAL, "provider" => provider.as_str())
                        .increment(1);
                    let delay = policy.effective_delay(attempt, e.retry_after());
                    warn!(
                        provider = provider.as_str(),
                        model,
                        attempt,
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e), // fatal, no retry
        }
    }
    Err(last_err.unwrap_or(WayfinderError::NoProvider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_hint_takes_precedence() {
        let policy = RetryPolicy::default();
        let delay = policy.effective_delay(1, Some(Duration::from_secs(7)));
        assert_eq!(delay, Duration::from_secs(7));
    }

    #[test]
    fn retry_after_hint_is_capped() {
        let policy = RetryPolicy::default();
        let delay = policy.effective_delay(1, Some(Duration::from_secs(120)));
        assert_eq!(delay, policy.max_delay);
    }

    #[test]
    fn jittered_delay_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for attempt in 1..=4 {
            let bare = policy.delay_for_attempt(attempt);
            for _ in 0..100 {
                let delay = policy.effective_delay(attempt, None);
                assert!(delay >= bare);
                assert!(delay <= bare.mul_f64(1.0 + JITTER_FRACTION).min(policy.max_delay));
            }
        }
    }
}
