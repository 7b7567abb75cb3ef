//! The provider adapter trait and shared HTTP error mapping.
//!
//! Each upstream backend gets one stateless adapter implementing
//! [`ProviderAdapter`]. Adapters own exactly two jobs: translate the unified
//! request (prompt, history, system prompt, model parameters) into the
//! backend's wire format, and normalise the reply into plain text or a
//! classified [`WayfinderError`](crate::WayfinderError). Retry, pacing,
//! caching, and dedup all live above this boundary.
//!
//! Adding a backend means implementing this trait and registering it with
//! the [`ProviderRegistry`](super::ProviderRegistry) — no dispatch code
//! changes anywhere else.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{Message, ModelConfig};
use crate::{Result, WayfinderError};

/// A stateless translator for one upstream LLM backend.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Adapter name for logging/debugging.
    fn name(&self) -> &str;

    /// Issue one HTTPS request and return the generated text.
    ///
    /// Message order on the wire: system prompt (if present) first, then
    /// `history` in order, then `prompt` as the final user turn. Fails with
    /// `EmptyResponse` when an otherwise-successful reply carries no text.
    async fn send(
        &self,
        prompt: &str,
        history: &[Message],
        system_prompt: Option<&str>,
        config: &ModelConfig,
        timeout: Duration,
    ) -> Result<String>;
}

/// Map a reqwest transport failure to a classified error.
///
/// Timeouts and connection-level failures are retryable network errors;
/// anything else is surfaced as a fatal `Http` error.
pub(crate) fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> WayfinderError {
    if err.is_timeout() {
        WayfinderError::Timeout(timeout)
    } else if err.is_connect() {
        WayfinderError::ConnectionReset
    } else {
        WayfinderError::Http(err.to_string())
    }
}

/// Map a non-success HTTP status to a classified error.
///
/// The original status code is preserved so retry classification downstream
/// stays a pure function of the error value.
pub(crate) fn classify_status(
    status: reqwest::StatusCode,
    retry_after: Option<Duration>,
    message: String,
) -> WayfinderError {
    match status.as_u16() {
        code @ (401 | 403) => WayfinderError::AuthenticationFailed { status: code },
        429 => WayfinderError::RateLimited { retry_after },
        code => WayfinderError::Api {
            status: code,
            message,
        },
    }
}

/// Parse an HTTP `Retry-After` header value (delta-seconds form only).
pub(crate) fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}
