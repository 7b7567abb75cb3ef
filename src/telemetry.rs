//! Telemetry metric name constants.
//!
//! Centralised metric names for wayfinder operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `wayfinder_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider` — provider id (e.g. "gemini", "deepseek")
//! - `status` — outcome: "ok" or "error"

/// Total generation requests dispatched through the gateway.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "wayfinder_requests_total";

/// Generation request duration in seconds, including retries and pacing.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "wayfinder_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "wayfinder_retries_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "wayfinder_cache_hits_total";

/// Total response cache misses.
pub const CACHE_MISSES_TOTAL: &str = "wayfinder_cache_misses_total";

/// Total callers coalesced onto an already in-flight request.
pub const DEDUP_JOINS_TOTAL: &str = "wayfinder_dedup_joins_total";

/// Total fail-fast rejections at the per-provider concurrency ceiling.
///
/// Labels: `provider`.
pub const RATE_LIMIT_REJECTIONS_TOTAL: &str = "wayfinder_rate_limit_rejections_total";
