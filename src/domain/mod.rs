//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - trials and their subgroup attributes (`Trial`, `SubgroupKey`)
//! - error curves and operating points (`ErrorCurve`, `OperatingPoints`)
//! - subgroup and fairness outputs (`SubgroupResultSet`, `FairnessReport`)
//! - run configuration (`EvalConfig`, `CompareConfig`, `SampleConfig`)

pub mod types;

pub use types::*;
