//! Core data types shared across the gateway.

mod message;
mod model;
mod options;
mod response;

pub use message::{Message, Role};
pub use model::{ModelConfig, ProviderId};
pub use options::GenerateOptions;
pub use response::GenerateResponse;
