//! Synthetic data sources.
//!
//! - seeded scored-trial generator with demographic attributes (`sample`)

pub mod sample;

pub use sample::*;
