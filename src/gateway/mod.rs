//! Gateway facade and builder.

mod builder;
mod facade;

pub use builder::{Wayfinder, WayfinderBuilder};
pub use facade::Gateway;
