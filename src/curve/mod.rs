//! Error curves and operating points.
//!
//! Responsibilities:
//!
//! - build the DET curve (fpr/fnr per threshold) of a scored trial set
//! - locate the minimum detection cost and equal error rate on that curve

pub mod det;
pub mod operating;

pub use det::*;
pub use operating::*;
