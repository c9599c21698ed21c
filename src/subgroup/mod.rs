//! Demographic subgroup evaluation.
//!
//! - enumerate subgroups from attribute values (`enumerate`)
//! - recompute curve + operating points per subgroup (`evaluator`)

pub mod enumerate;
pub mod evaluator;

pub use enumerate::*;
pub use evaluator::*;
