//! Operating points on an error curve: minimum detection cost and EER.
//!
//! Both are exhaustive searches over the sampled curve rows. NaN candidates
//! are skipped (never selected, never fatal); ties go to the first row in
//! threshold order.

use tracing::debug;

use crate::curve::det::{CurveEstimator, DetCurve};
use crate::domain::{CostParams, ErrorCurve, Evaluation, OperatingPoints};
use crate::error::EvalError;

/// Minimum of the detection cost function and its threshold.
pub fn min_cost(curve: &ErrorCurve, cost: &CostParams) -> Result<(f64, f64), EvalError> {
    let costs = curve.iter().map(|p| cost.cost(p.fpr, p.fnr));
    let idx = nan_argmin(costs).ok_or_else(|| {
        EvalError::NumericDegenerate("no comparable detection cost on the curve".to_string())
    })?;
    let p = curve.points()[idx];
    Ok((cost.cost(p.fpr, p.fnr), p.threshold))
}

/// Equal error rate (percent) and its threshold.
///
/// The EER row is the one minimizing `|fnr - fpr|`; the rate reported is the
/// larger of the two at that row.
pub fn equal_error_rate(curve: &ErrorCurve) -> Result<(f64, f64), EvalError> {
    let gaps = curve.iter().map(|p| (p.fnr - p.fpr).abs());
    let idx = nan_argmin(gaps).ok_or_else(|| {
        EvalError::NumericDegenerate("no comparable fpr/fnr pair on the curve".to_string())
    })?;
    let p = curve.points()[idx];
    Ok((p.fpr.max(p.fnr) * 100.0, p.threshold))
}

/// Both operating points of one curve.
pub fn operating_points(curve: &ErrorCurve, cost: &CostParams) -> Result<OperatingPoints, EvalError> {
    let (min_cost, min_cost_threshold) = min_cost(curve, cost)?;
    let (eer, eer_threshold) = equal_error_rate(curve)?;
    debug!(
        rows = curve.len(),
        min_cost, min_cost_threshold, eer, eer_threshold, "operating points"
    );
    Ok(OperatingPoints {
        min_cost,
        min_cost_threshold,
        eer,
        eer_threshold,
    })
}

/// Curve + operating points of a whole (pooled) population.
pub fn evaluate_population(
    scores: &[f64],
    labels: &[u8],
    cost: &CostParams,
) -> Result<Evaluation, EvalError> {
    evaluate_with(&DetCurve, scores, labels, cost)
}

/// Like `evaluate_population`, with an explicit curve estimator.
pub fn evaluate_with(
    estimator: &dyn CurveEstimator,
    scores: &[f64],
    labels: &[u8],
    cost: &CostParams,
) -> Result<Evaluation, EvalError> {
    cost.validate()?;
    let curve = estimator.curve(scores, labels)?;
    let metrics = operating_points(&curve, cost)?;
    Ok(Evaluation {
        curve,
        metrics,
        cost: *cost,
    })
}

/// Index of the first minimum, ignoring NaN values.
pub(crate) fn nan_argmin(values: impl Iterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, v) in values.enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((idx, v)),
        }
    }
    best.map(|(idx, _)| idx)
}
