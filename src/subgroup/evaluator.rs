//! Per-subgroup recomputation of curves and operating points.
//!
//! Each subgroup is independent, so the combinations are evaluated in
//! parallel and merged back in enumeration order. A subgroup that cannot be
//! evaluated (no trials, one class only, ...) is skipped with a diagnostic;
//! it never aborts the batch.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::curve::det::{CurveEstimator, DetCurve};
use crate::curve::operating::evaluate_with;
use crate::domain::{
    CostParams, Evaluation, SkipReason, SubgroupDiagnostic, SubgroupKey, SubgroupMetrics,
    SubgroupResultSet, TaggedCurveTable, Trial,
};
use crate::error::EvalError;
use crate::subgroup::enumerate::{enumerate_keys, validate_attributes};

static DET_CURVE: DetCurve = DetCurve;

/// Evaluates subgroups of a trial set with fixed cost parameters.
pub struct SubgroupEvaluator<'a> {
    estimator: &'a dyn CurveEstimator,
    cost: CostParams,
}

impl SubgroupEvaluator<'static> {
    pub fn new(cost: CostParams) -> Self {
        Self {
            estimator: &DET_CURVE,
            cost,
        }
    }
}

impl<'a> SubgroupEvaluator<'a> {
    pub fn with_estimator(estimator: &'a dyn CurveEstimator, cost: CostParams) -> Self {
        Self { estimator, cost }
    }

    pub fn cost(&self) -> &CostParams {
        &self.cost
    }

    /// Evaluate every combination of observed values of `attributes`.
    pub fn evaluate(&self, trials: &[Trial], attributes: &[String]) -> Result<SubgroupResultSet, EvalError> {
        let keys = enumerate_keys(trials, attributes)?;
        self.evaluate_keys(trials, attributes, &keys)
    }

    /// Evaluate an explicit list of subgroup filters.
    ///
    /// Every key must name exactly `attributes`, in that order. Keys whose
    /// values match no trial are skipped like any other empty subgroup.
    pub fn evaluate_keys(
        &self,
        trials: &[Trial],
        attributes: &[String],
        keys: &[SubgroupKey],
    ) -> Result<SubgroupResultSet, EvalError> {
        validate_attributes(attributes)?;
        self.cost.validate()?;
        for key in keys {
            if !key.attributes().eq(attributes.iter().map(String::as_str)) {
                return Err(EvalError::invalid(format!(
                    "subgroup [{key}] does not match attributes [{}]",
                    attributes.join(", ")
                )));
            }
        }

        let outcomes: Vec<Result<Evaluation, SkipReason>> = keys
            .par_iter()
            .map(|key| self.evaluate_one(trials, key))
            .collect();

        let mut curves = TaggedCurveTable::new(attributes.to_vec());
        let mut metrics = Vec::new();
        let mut diagnostics = Vec::new();
        let mut ids: HashMap<String, SubgroupKey> = HashMap::new();

        for (key, outcome) in keys.iter().zip(outcomes) {
            let eval = match outcome {
                Ok(eval) => eval,
                Err(reason) => {
                    warn!(subgroup = %key, %reason, "skipping subgroup");
                    diagnostics.push(SubgroupDiagnostic {
                        key: key.clone(),
                        reason,
                    });
                    continue;
                }
            };

            let id = key.id();
            if let Some(first) = ids.get(&id) {
                let reason = SkipReason::IdCollision { with: first.clone() };
                warn!(subgroup = %key, %reason, "subgroup identifier collision");
                diagnostics.push(SubgroupDiagnostic {
                    key: key.clone(),
                    reason,
                });
            } else {
                ids.insert(id.clone(), key.clone());
            }

            let tags: Vec<String> = key.values().map(str::to_string).collect();
            curves.push_curve(&tags, &eval.curve)?;
            metrics.push(SubgroupMetrics {
                id,
                key: key.clone(),
                metrics: eval.metrics,
            });
        }

        info!(
            attributes = %attributes.join(","),
            evaluated = metrics.len(),
            skipped = keys.len() - metrics.len(),
            "subgroup evaluation finished"
        );

        Ok(SubgroupResultSet {
            attributes: attributes.to_vec(),
            cost: self.cost,
            curves,
            metrics,
            diagnostics,
        })
    }

    fn evaluate_one(&self, trials: &[Trial], key: &SubgroupKey) -> Result<Evaluation, SkipReason> {
        let (scores, labels): (Vec<f64>, Vec<u8>) = trials
            .iter()
            .filter(|t| key.matches(t))
            .map(|t| (t.score, t.label))
            .unzip();
        if scores.is_empty() {
            return Err(SkipReason::Empty);
        }
        evaluate_with(self.estimator, &scores, &labels, &self.cost).map_err(|e| SkipReason::Failed {
            message: e.to_string(),
        })
    }
}
