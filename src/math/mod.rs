//! Mathematical utilities.

pub mod probit;

pub use probit::*;
