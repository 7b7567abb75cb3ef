//! Wayfinder error types.
//!
//! Errors are classified once, at the point of occurrence (inside a provider
//! adapter or the rate limiter), and carried as data from there on. Retry
//! decisions are a pure function of the error value and the active
//! [`RetryPolicy`](crate::RetryPolicy) — nothing upstream reclassifies.
//!
//! All variants are `Clone` so a settled result can fan out to every caller
//! joined on the same in-flight request.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::types::ProviderId;

/// Wayfinder error types.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WayfinderError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection reset by upstream")]
    ConnectionReset,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited upstream, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// 401 or 403 from upstream; `status` keeps which one.
    #[error("authentication failed ({status})")]
    AuthenticationFailed { status: u16 },

    // Data errors
    #[error("empty response from model")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("no provider configured")]
    NoProvider,

    #[error("provider not configured: {0}")]
    UnconfiguredProvider(ProviderId),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    // Local admission control
    /// The per-provider concurrency ceiling was hit. Fail-fast by design:
    /// callers decide whether to retry later, the gateway never queues.
    #[error("concurrency ceiling reached for provider {0}")]
    RateLimitExceeded(ProviderId),

    // Terminal outcome after exhausted retries
    #[error("generation failed after {attempts} attempts: {cause}")]
    GenerationFailed {
        attempts: u32,
        cause: Box<WayfinderError>,
    },
}

impl WayfinderError {
    /// The upstream HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::AuthenticationFailed { status } => Some(*status),
            _ => None,
        }
    }

    /// Upstream `Retry-After` hint, if the provider sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether a retry orchestrator should attempt this call again.
    ///
    /// Retryable: network timeouts, connection resets, and HTTP statuses in
    /// `retryable_statuses`. Everything else — bad requests, auth failures,
    /// malformed or empty payloads, local rate-limit rejections — is fatal.
    pub fn is_retryable(&self, retryable_statuses: &BTreeSet<u16>) -> bool {
        match self {
            Self::Timeout(_) | Self::ConnectionReset => true,
            Self::RateLimited { .. } => retryable_statuses.contains(&429),
            Self::Api { status, .. } => retryable_statuses.contains(status),
            _ => false,
        }
    }
}

/// Result type alias for wayfinder operations.
pub type Result<T> = std::result::Result<T, WayfinderError>;
