//! Generation response type.

use serde::{Deserialize, Serialize};

use crate::types::ProviderId;

/// A completed generation.
///
/// Only produced on success — `text` is always non-empty (adapters reject
/// empty payloads with `EmptyResponse`). Failures travel as
/// [`WayfinderError`](crate::WayfinderError), never as a partially populated
/// response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated text.
    pub text: String,
    /// Provider that served the call.
    pub provider: ProviderId,
    /// Model that served the call.
    pub model: String,
}
