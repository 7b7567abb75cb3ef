//! Provider adapters and the per-provider control plane.

pub mod gemini;
pub mod openai;
pub mod rate_limit;
pub mod registry;
pub mod retry;
pub mod traits;

pub use gemini::GeminiAdapter;
pub use openai::OpenAiCompatAdapter;
pub use rate_limit::{RateLimit, RateLimitPermit, RateLimiter};
pub use registry::ProviderRegistry;
pub use retry::RetryPolicy;
pub use traits::ProviderAdapter;
