//! `sveva` library crate: speaker verification evaluation with subgroup fairness.
//!
//! The binary (`sveva`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - curves, subgroup results and differentials are reusable from other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod compare;
pub mod curve;
pub mod data;
pub mod domain;
pub mod error;
pub mod fairness;
pub mod io;
pub mod math;
pub mod report;
pub mod subgroup;
