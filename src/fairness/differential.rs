//! Fairness differentials of subgroups against a pooled baseline.
//!
//! Two views, both per subgroup:
//!
//! - **cost**: the subgroup's detection cost when forced to use the pooled
//!   minimum-cost threshold, relative to the pooled minimum cost
//!   (`overall_cdet_diff`) and to the subgroup's own minimum
//!   (`sg_cdet_diff`).
//! - **rates**: FPR/FNR at the pooled threshold relative to the pooled rates
//!   (`overall_*_diff`), and FPR/FNR at the subgroup's own threshold relative
//!   to its rates at the pooled one (`sg_*_diff`).
//!
//! A ratio is only reported when it is defined: finite operands and a
//! non-zero denominator. Otherwise it is `None`.

use tracing::debug;

use crate::domain::{
    CostDifferentialRow, ErrorCurve, Evaluation, FairnessReport, RateDifferentialRow,
    SubgroupMetrics, SubgroupResultSet, ThresholdKind,
};
use crate::error::EvalError;
use crate::fairness::align::align;

/// `num / den`, or `None` when the quotient is undefined.
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    (num.is_finite() && den.is_finite() && den != 0.0).then(|| num / den)
}

/// Cost differential of every subgroup in `results`.
pub fn cdet_diff(results: &SubgroupResultSet, baseline: &Evaluation) -> Result<Vec<CostDifferentialRow>, EvalError> {
    check_cost(results, baseline)?;
    let threshold = baseline.metrics.min_cost_threshold;

    results
        .metrics
        .iter()
        .map(|m| {
            let curve = subgroup_curve(results, m)?;
            let at_pooled = align(&curve, threshold, false)?;
            let sg_cost = results.cost.cost(at_pooled.fpr, at_pooled.fnr);
            Ok(CostDifferentialRow {
                subgroup: m.id.clone(),
                key: m.key.clone(),
                sg_cost_at_overall_threshold: sg_cost,
                sg_min_cost: m.metrics.min_cost,
                overall_cdet_diff: ratio(sg_cost, baseline.metrics.min_cost),
                sg_cdet_diff: ratio(m.metrics.min_cost, sg_cost),
            })
        })
        .collect()
}

/// Rate differential of every subgroup, anchored at thresholds of `kind`.
pub fn fpfn_diff(
    results: &SubgroupResultSet,
    baseline: &Evaluation,
    kind: ThresholdKind,
) -> Result<Vec<RateDifferentialRow>, EvalError> {
    check_cost(results, baseline)?;
    let pooled_threshold = baseline.metrics.threshold(kind);
    let pooled = align(&baseline.curve, pooled_threshold, false)?;

    results
        .metrics
        .iter()
        .map(|m| {
            let curve = subgroup_curve(results, m)?;
            let sg_threshold = m.metrics.threshold(kind);
            let sg_at_pooled = align(&curve, pooled_threshold, false)?;
            let sg_at_own = align(&curve, sg_threshold, false)?;
            Ok(RateDifferentialRow {
                subgroup: m.id.clone(),
                key: m.key.clone(),
                threshold_kind: kind,
                pooled_threshold,
                sg_threshold,
                pooled,
                sg_at_pooled,
                sg_at_own,
                overall_fpr_diff: ratio(sg_at_pooled.fpr, pooled.fpr),
                overall_fnr_diff: ratio(sg_at_pooled.fnr, pooled.fnr),
                sg_fpr_diff: ratio(sg_at_own.fpr, sg_at_pooled.fpr),
                sg_fnr_diff: ratio(sg_at_own.fnr, sg_at_pooled.fnr),
            })
        })
        .collect()
}

/// Both differentials.
pub fn fairness_report(
    results: &SubgroupResultSet,
    baseline: &Evaluation,
    kind: ThresholdKind,
) -> Result<FairnessReport, EvalError> {
    let cost = cdet_diff(results, baseline)?;
    let rates = fpfn_diff(results, baseline, kind)?;
    debug!(subgroups = cost.len(), threshold = kind.field_name(), "fairness report");
    Ok(FairnessReport { cost, rates })
}

fn check_cost(results: &SubgroupResultSet, baseline: &Evaluation) -> Result<(), EvalError> {
    if results.cost != baseline.cost {
        return Err(EvalError::CostMismatch);
    }
    Ok(())
}

fn subgroup_curve(results: &SubgroupResultSet, m: &SubgroupMetrics) -> Result<ErrorCurve, EvalError> {
    let curve = results.curves.select(&m.key);
    if curve.is_empty() {
        return Err(EvalError::UnknownSubgroup(m.id.clone()));
    }
    Ok(curve)
}
