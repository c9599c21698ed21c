//! Reading a curve off at a foreign threshold.
//!
//! Subgroup curves are sampled at the subgroup's own distinct scores, so a
//! threshold chosen on another population (usually the pooled one) rarely
//! lands exactly on a row. We take the row whose threshold is nearest.

use crate::curve::operating::nan_argmin;
use crate::domain::{ErrorCurve, RatePair};
use crate::error::EvalError;
use crate::math::probit;

/// `(fpr, fnr)` of the row nearest `target`, optionally on the probit scale.
///
/// Ties go to the first (lowest-threshold) row.
pub fn align(curve: &ErrorCurve, target: f64, normalize: bool) -> Result<RatePair, EvalError> {
    let distances = curve.iter().map(|p| (p.threshold - target).abs());
    let idx = nan_argmin(distances).ok_or(EvalError::AlignmentMiss { target })?;
    let p = curve.points()[idx];

    if normalize {
        Ok(RatePair {
            fpr: probit(p.fpr),
            fnr: probit(p.fnr),
        })
    } else {
        Ok(RatePair {
            fpr: p.fpr,
            fnr: p.fnr,
        })
    }
}
