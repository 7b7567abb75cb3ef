//! TTL-keyed response cache with lazy expiry.
//!
//! Keys are caller-supplied: the prompt-construction layer decides which
//! requests are semantically identical, the cache only maps key → response
//! for the caller's TTL. Expired entries are dropped lazily on `get`; a
//! small random fraction of `insert` calls additionally sweeps the whole
//! map, bounding growth without a dedicated background task.
//!
//! The cache sits in [`Gateway`](crate::Gateway), above dedup, rate
//! limiting, and retry — a hit bypasses all of them.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::telemetry;
use crate::types::GenerateResponse;

/// TTL applied when a caller supplies a cache key but no TTL.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Fraction of `insert` calls that trigger a full expired-entry sweep.
const SWEEP_PROBABILITY: f64 = 0.02;

struct CacheEntry {
    value: GenerateResponse,
    expires_at: Instant,
}

/// In-memory TTL cache for completed generations.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a live entry, evicting it if stale.
    ///
    /// Emits cache hit/miss metrics.
    pub async fn get(&self, key: &str) -> Option<GenerateResponse> {
        let mut entries = self.entries.lock().await;
        let live = match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        match live {
            Some(value) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(value)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Store a response under `key`, overwriting any prior entry.
    pub async fn insert(&self, key: impl Into<String>, value: GenerateResponse, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        if rand::random::<f64>() < SWEEP_PROBABILITY {
            sweep(&mut entries);
        }
    }

    /// Number of stored entries, live or not-yet-swept.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop every expired entry.
fn sweep(entries: &mut HashMap<String, CacheEntry>) {
    let before = entries.len();
    let now = Instant::now();
    entries.retain(|_, entry| now < entry.expires_at);
    trace!(evicted = before - entries.len(), "swept expired cache entries");
}
