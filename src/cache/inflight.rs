//! In-flight request coalescing.
//!
//! Concurrent calls sharing a cache key collapse onto one upstream
//! execution: the first caller registers a shared future under the key, and
//! later arrivals await a clone of it, so all of them observe the same
//! eventual success or failure.
//!
//! Unregistering the key is baked into the shared future itself, not left to
//! the caller that registered it: the future removes its own entry as its
//! final step, before yielding the result. Whichever caller drives it to
//! completion triggers the removal, so a key never stays stuck — even when
//! the registering caller's future is dropped mid-flight.
//!
//! Only calls carrying an explicit cache key pass through here; everything
//! else executes directly.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::debug;

use crate::telemetry;
use crate::types::GenerateResponse;
use crate::Result;

type SharedResult = Shared<BoxFuture<'static, Result<GenerateResponse>>>;
type PendingMap = Arc<Mutex<HashMap<String, SharedResult>>>;

/// Registry of not-yet-settled executions, keyed by cache key.
pub(crate) struct InFlight {
    pending: PendingMap,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Join an existing execution for `key`, or start `start` as the new one.
    pub(crate) async fn join_or_start<F>(&self, key: &str, start: F) -> Result<GenerateResponse>
    where
        F: Future<Output = Result<GenerateResponse>> + Send + 'static,
    {
        let (shared, joined) = {
            let mut pending = self.pending.lock().await;
            match pending.get(key) {
                Some(existing) => (existing.clone(), true),
                None => {
                    let map = Arc::clone(&self.pending);
                    let owned_key = key.to_string();
                    let shared = async move {
                        let result = start.await;
                        map.lock().await.remove(&owned_key);
                        result
                    }
                    .boxed()
                    .shared();
                    pending.insert(key.to_string(), shared.clone());
                    (shared, false)
                }
            }
        };

        if joined {
            metrics::counter!(telemetry::DEDUP_JOINS_TOTAL).increment(1);
            debug!(cache_key = key, "joining in-flight request");
        }
        shared.await
    }

    /// Number of not-yet-settled registrations.
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderId;
    use crate::WayfinderError;
    use std::time::Duration;

    fn response(text: &str) -> GenerateResponse {
        GenerateResponse {
            text: text.to_string(),
            provider: ProviderId::Gemini,
            model: "gemini-2.0-flash".to_string(),
        }
    }

    #[tokio::test]
    async fn entry_is_removed_after_success() {
        let inflight = InFlight::new();
        let result = inflight
            .join_or_start("k", async { Ok(response("hi")) })
            .await;
        assert_eq!(result.map(|r| r.text).ok().as_deref(), Some("hi"));
        assert_eq!(inflight.len().await, 0);
    }

    #[tokio::test]
    async fn entry_is_removed_after_failure() {
        let inflight = InFlight::new();
        let result = inflight
            .join_or_start("k", async { Err(WayfinderError::EmptyResponse) })
            .await;
        assert!(result.is_err());
        assert_eq!(inflight.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn key_is_freed_even_when_the_first_caller_is_dropped() {
        let inflight = Arc::new(InFlight::new());
        let first = tokio::spawn({
            let inflight = Arc::clone(&inflight);
            async move {
                inflight
                    .join_or_start("k", async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(response("late"))
                    })
                    .await
            }
        });
        tokio::task::yield_now().await;
        assert_eq!(inflight.len().await, 1);
        first.abort();
        let _ = first.await;

        // The registration survives the dropped caller; the next caller
        // drives the pending execution and the removal runs as part of the
        // shared future.
        let result = inflight
            .join_or_start("k", async { Ok(response("unused")) })
            .await;
        assert_eq!(result.map(|r| r.text).ok().as_deref(), Some("late"));
        assert_eq!(inflight.len().await, 0);
    }
}
