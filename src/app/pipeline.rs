//! Shared evaluation pipelines used by the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> pooled baseline -> subgroups -> fairness differentials
//!
//! The command handlers can then focus on presentation and exports.

use tracing::{info, warn};

use crate::compare::{ExperimentComparison, ExperimentInput, compare};
use crate::curve::operating::evaluate_population;
use crate::domain::{
    CompareConfig, EvalConfig, Evaluation, FairnessReport, SubgroupResultSet, TaggedCurveTable,
    scores_and_labels,
};
use crate::error::AppError;
use crate::fairness::fairness_report;
use crate::io::ingest::{IngestedTrials, load_trials};
use crate::subgroup::evaluator::SubgroupEvaluator;

/// All computed outputs of a single `sveva evaluate` run.
#[derive(Debug, Clone)]
pub struct EvalOutput {
    pub ingest: IngestedTrials,
    pub baseline: Evaluation,
    /// `None` when no subgroup attributes were requested.
    pub subgroups: Option<SubgroupResultSet>,
    /// `None` without subgroups, or when every subgroup was skipped.
    pub fairness: Option<FairnessReport>,
}

impl EvalOutput {
    /// The pooled curve as an untagged table.
    pub fn pooled_curve_table(&self) -> Result<TaggedCurveTable, AppError> {
        let mut table = TaggedCurveTable::new(Vec::new());
        table.push_curve(&[], &self.baseline.curve)?;
        Ok(table)
    }
}

/// All computed outputs of a `sveva compare` run.
#[derive(Debug, Clone)]
pub struct CompareOutput {
    /// Per-run subgroup results, in command-line order.
    pub runs: Vec<(String, SubgroupResultSet)>,
    pub comparison: ExperimentComparison,
}

/// Load the scores file and evaluate it.
pub fn run_evaluate(config: &EvalConfig) -> Result<EvalOutput, AppError> {
    let ingest = load_trials(&config.scores_path, &config.attributes)?;
    evaluate_trials(ingest, config)
}

/// Evaluate already-loaded trials.
pub fn evaluate_trials(ingest: IngestedTrials, config: &EvalConfig) -> Result<EvalOutput, AppError> {
    // 1) Pooled baseline.
    let (scores, labels) = scores_and_labels(&ingest.trials);
    let baseline = evaluate_population(&scores, &labels, &config.cost)?;
    info!(
        min_cost = baseline.metrics.min_cost,
        eer = baseline.metrics.eer,
        "pooled evaluation"
    );

    if config.attributes.is_empty() {
        return Ok(EvalOutput {
            ingest,
            baseline,
            subgroups: None,
            fairness: None,
        });
    }

    // 2) Subgroups.
    let subgroups =
        SubgroupEvaluator::new(config.cost).evaluate(&ingest.trials, &config.attributes)?;

    // 3) Fairness differentials against the pooled baseline.
    let fairness = if subgroups.metrics.is_empty() {
        warn!("every subgroup was skipped; no fairness differentials");
        None
    } else {
        Some(fairness_report(&subgroups, &baseline, config.threshold_kind)?)
    };

    Ok(EvalOutput {
        ingest,
        baseline,
        subgroups: Some(subgroups),
        fairness,
    })
}

/// Evaluate every run on the same subgroups and aggregate them.
pub fn run_compare(config: &CompareConfig) -> Result<CompareOutput, AppError> {
    let evaluator = SubgroupEvaluator::new(config.cost);

    let mut runs = Vec::with_capacity(config.runs.len());
    for (label, path) in &config.runs {
        let ingest = load_trials(path, &config.attributes)?;
        let results = evaluator.evaluate(&ingest.trials, &config.attributes)?;
        info!(run = %label, subgroups = results.metrics.len(), "evaluated run");
        runs.push((label.clone(), results));
    }

    let inputs: Vec<ExperimentInput<'_>> = runs
        .iter()
        .map(|(label, results)| ExperimentInput::from_result_set(label, results))
        .collect();
    let comparison = compare(&inputs, &config.column)?;

    Ok(CompareOutput { runs, comparison })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    use crate::data::{generate_trials, write_sample_csv};
    use crate::domain::{CostParams, SampleConfig, ThresholdKind};

    fn write_sample(dir: &Path, name: &str, seed: u64, shifts: Vec<(String, f64)>) -> PathBuf {
        let path = dir.join(name);
        let config = SampleConfig {
            out: path.clone(),
            trials: 800,
            seed,
            genuine_fraction: 0.5,
            separation: 2.5,
            shifts,
        };
        write_sample_csv(&path, &generate_trials(&config).unwrap()).unwrap();
        path
    }

    fn eval_config(path: PathBuf, attributes: &[&str]) -> EvalConfig {
        EvalConfig {
            scores_path: path,
            attributes: attributes.iter().map(|s| s.to_string()).collect(),
            cost: CostParams::default(),
            threshold_kind: ThresholdKind::MinCost,
            export_curve: None,
            export_fairness: None,
            export_json: None,
        }
    }

    #[test]
    fn pooled_only_run_has_no_subgroups() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "s.csv", 1, Vec::new());
        let out = run_evaluate(&eval_config(path, &[])).unwrap();

        assert_eq!(out.ingest.trials.len(), 800);
        assert!(out.subgroups.is_none());
        assert!(out.fairness.is_none());
        assert_eq!(out.pooled_curve_table().unwrap().len(), out.baseline.curve.len());
    }

    #[test]
    fn shifted_group_shows_up_in_fairness_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "s.csv", 2, vec![("india".to_string(), -1.5)]);
        let out = run_evaluate(&eval_config(path, &["nationality"])).unwrap();

        let subgroups = out.subgroups.unwrap();
        assert_eq!(subgroups.metrics.len(), 4);
        let fairness = out.fairness.unwrap();
        let india = fairness.rates.iter().find(|r| r.subgroup == "india").unwrap();
        let usa = fairness.rates.iter().find(|r| r.subgroup == "usa").unwrap();
        assert!(india.sg_at_pooled.fnr > usa.sg_at_pooled.fnr);
    }

    #[test]
    fn compare_runs_in_command_line_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_sample(dir.path(), "a.csv", 3, Vec::new());
        let b = write_sample(dir.path(), "b.csv", 4, Vec::new());
        let config = CompareConfig {
            runs: vec![("b".to_string(), b), ("a".to_string(), a)],
            attributes: vec!["gender".to_string()],
            cost: CostParams::default(),
            column: "experiment".to_string(),
            export_curve: None,
            export_json: None,
        };
        let out = run_compare(&config).unwrap();

        assert_eq!(out.comparison.labels().collect::<Vec<_>>(), vec!["b", "a"]);
        let total: usize = out.runs.iter().map(|(_, r)| r.curves.len()).sum();
        assert_eq!(out.comparison.curves.len(), total);
    }

    #[test]
    fn missing_scores_file_is_a_usage_error() {
        let err = run_evaluate(&eval_config(PathBuf::from("/nonexistent/scores.csv"), &[])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
