//! Wayfinder - AI provider gateway for travel-planning assistants
//!
//! This crate provides one reliable `generate(prompt, options) -> text` call
//! on top of several interchangeable, rate-limited LLM backends. The gateway
//! enforces per-provider pacing and concurrency limits, retries transient
//! failures with exponential backoff, coalesces identical in-flight
//! requests, and caches completed responses under caller-supplied keys.
//!
//! It consumes a finished prompt (plus optional system prompt and
//! conversation history) and returns plain text or a classified error — no
//! templating, no streaming, no tool calling.
//!
//! # Example
//!
//! ```rust,no_run
//! use wayfinder::{GenerateOptions, ProviderId, Wayfinder};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> wayfinder::Result<()> {
//!     let gateway = Wayfinder::builder()
//!         .gemini("your-gemini-key")
//!         .deepseek("your-deepseek-key")
//!         .build()?;
//!
//!     let options = GenerateOptions::new()
//!         .provider(ProviderId::Gemini)
//!         .system_prompt("You are a concise travel assistant.")
//!         .cache_key("itinerary:rome:3-days")
//!         .cache_ttl(Duration::from_secs(600));
//!
//!     let text = gateway
//!         .generate_text("Plan a 3-day itinerary for Rome.", &options)
//!         .await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use error::{Result, WayfinderError};
pub use gateway::{Gateway, Wayfinder, WayfinderBuilder};
pub use providers::{ProviderAdapter, RateLimit, RateLimiter, RetryPolicy};

// Re-export all types
pub use types::{GenerateOptions, GenerateResponse, Message, ModelConfig, ProviderId, Role};
