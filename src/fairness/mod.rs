//! Fairness analysis of subgroups against the pooled population.
//!
//! - read rates off a curve at a foreign threshold (`align`)
//! - cost and rate differentials per subgroup (`differential`)

pub mod align;
pub mod differential;

pub use align::*;
pub use differential::*;
