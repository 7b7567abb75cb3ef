//! Response caching and in-flight request coalescing.

mod inflight;
mod response;

pub(crate) use inflight::InFlight;
pub use response::{ResponseCache, DEFAULT_CACHE_TTL};
