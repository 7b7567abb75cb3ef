//! Tests for metrics emission.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use metrics_util::MetricKind;

use wayfinder::gateway::Gateway;
use wayfinder::telemetry;
use wayfinder::{
    GenerateOptions, Message, ModelConfig, ProviderAdapter, ProviderId, Result, RetryPolicy,
    Wayfinder, WayfinderError,
};

// ============================================================================
// Mock adapters
// ============================================================================

struct EchoAdapter;

#[async_trait]
impl ProviderAdapter for EchoAdapter {
    fn name(&self) -> &str {
        "echo"
    }

    async fn send(
        &self,
        prompt: &str,
        _history: &[Message],
        _system_prompt: Option<&str>,
        _config: &ModelConfig,
        _timeout: Duration,
    ) -> Result<String> {
        Ok(prompt.to_string())
    }
}

struct FailingAdapter;

#[async_trait]
impl ProviderAdapter for FailingAdapter {
    fn name(&self) -> &str {
        "failing"
    }

    async fn send(
        &self,
        _prompt: &str,
        _history: &[Message],
        _system_prompt: Option<&str>,
        _config: &ModelConfig,
        _timeout: Duration,
    ) -> Result<String> {
        Err(WayfinderError::AuthenticationFailed { status: 401 })
    }
}

fn gateway_with(adapter: Arc<dyn ProviderAdapter>) -> Gateway {
    match Wayfinder::builder()
        .adapter(ProviderId::Gemini, adapter)
        .retry(RetryPolicy::disabled())
        .build()
    {
        Ok(gateway) => gateway,
        Err(e) => panic!("builder failed: {e}"),
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values matching a metric name and a specific label pair.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => *c,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn successful_request_records_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let gateway = gateway_with(Arc::new(EchoAdapter));
                gateway.generate("hello", &GenerateOptions::new()).await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "status", "ok"),
        1
    );
    assert!(
        has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_request_records_error_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let _result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let gateway = gateway_with(Arc::new(FailingAdapter));
                gateway.generate("hello", &GenerateOptions::new()).await
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(&snapshot, telemetry::REQUESTS_TOTAL, "status", "error"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn cache_hits_and_misses_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let gateway = gateway_with(Arc::new(EchoAdapter));
                let options = GenerateOptions::new().cache_key("trip:rome");
                let first = gateway.generate("hello", &options).await;
                assert!(first.is_ok());
                let second = gateway.generate("hello", &options).await;
                assert!(second.is_ok());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
    // Only the first call reached the provider.
    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let gateway = gateway_with(Arc::new(EchoAdapter));
    let result = gateway.generate("hello", &GenerateOptions::new()).await;
    assert!(result.is_ok());
}
