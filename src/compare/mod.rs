//! Side-by-side comparison of independent evaluation runs.
//!
//! Pure concatenation: each run's tagged curve table gets one extra column
//! holding the run label, and the metrics are collected per label. Nothing
//! is recomputed and no input is modified.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{SubgroupMetrics, SubgroupResultSet, TaggedCurveTable};
use crate::error::EvalError;

/// One run to compare, borrowed from its owner.
#[derive(Debug, Clone, Copy)]
pub struct ExperimentInput<'a> {
    pub label: &'a str,
    pub curves: &'a TaggedCurveTable,
    pub metrics: &'a [SubgroupMetrics],
}

impl<'a> ExperimentInput<'a> {
    pub fn from_result_set(label: &'a str, results: &'a SubgroupResultSet) -> Self {
        Self {
            label,
            curves: &results.curves,
            metrics: &results.metrics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentMetrics {
    pub label: String,
    pub metrics: Vec<SubgroupMetrics>,
}

/// Concatenated curves tagged by run label, plus per-run metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentComparison {
    /// Name of the column that holds the run label.
    pub column: String,
    pub curves: TaggedCurveTable,
    /// In input order.
    pub runs: Vec<ExperimentMetrics>,
}

impl ExperimentComparison {
    pub fn get(&self, label: &str) -> Option<&[SubgroupMetrics]> {
        self.runs
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.metrics.as_slice())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.runs.iter().map(|r| r.label.as_str())
    }
}

/// Merge several runs into one comparison table.
pub fn compare(inputs: &[ExperimentInput<'_>], column: &str) -> Result<ExperimentComparison, EvalError> {
    if column.trim().is_empty() {
        return Err(EvalError::invalid("comparison column name is empty"));
    }
    let Some(first) = inputs.first() else {
        return Err(EvalError::invalid("nothing to compare"));
    };

    let mut columns = first.curves.columns().to_vec();
    columns.push(column.to_string());
    let mut curves = TaggedCurveTable::new(columns);
    let mut runs = Vec::with_capacity(inputs.len());
    let mut seen = HashSet::new();

    for input in inputs {
        if input.label.trim().is_empty() {
            return Err(EvalError::invalid("experiment label is empty"));
        }
        if !seen.insert(input.label) {
            return Err(EvalError::invalid(format!(
                "duplicate experiment label '{}'",
                input.label
            )));
        }
        let tagged = input.curves.with_column(column, input.label)?;
        curves.append(&tagged)?;
        runs.push(ExperimentMetrics {
            label: input.label.to_string(),
            metrics: input.metrics.to_vec(),
        });
    }

    Ok(ExperimentComparison {
        column: column.to_string(),
        curves,
        runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CostParams, SubgroupKey, Trial};
    use crate::subgroup::evaluator::SubgroupEvaluator;

    fn run(shift: f64) -> SubgroupResultSet {
        let trials: Vec<Trial> = ["f", "m"]
            .iter()
            .flat_map(|g| {
                (0..6).flat_map(move |i| {
                    let s = i as f64 / 10.0;
                    [
                        Trial::new(s + shift, 1).with_attr("gender", *g),
                        Trial::new(s, 0).with_attr("gender", *g),
                    ]
                })
            })
            .collect();
        SubgroupEvaluator::new(CostParams::default())
            .evaluate(&trials, &["gender".to_string()])
            .unwrap()
    }

    #[test]
    fn runs_are_concatenated_and_tagged() {
        let baseline = run(0.2);
        let improved = run(0.4);
        let inputs = [
            ExperimentInput::from_result_set("baseline", &baseline),
            ExperimentInput::from_result_set("improved", &improved),
        ];
        let cmp = compare(&inputs, "experiment").unwrap();

        assert_eq!(cmp.curves.columns(), ["gender".to_string(), "experiment".to_string()]);
        assert_eq!(cmp.curves.len(), baseline.curves.len() + improved.curves.len());
        assert_eq!(cmp.labels().collect::<Vec<_>>(), vec!["baseline", "improved"]);
        assert_eq!(cmp.get("improved").unwrap(), improved.metrics.as_slice());

        let key = SubgroupKey::new(vec![
            ("gender".to_string(), "m".to_string()),
            ("experiment".to_string(), "improved".to_string()),
        ]);
        let m_key = SubgroupKey::new(vec![("gender".to_string(), "m".to_string())]);
        assert_eq!(cmp.curves.select(&key), improved.curves.select(&m_key));

        // Inputs are untouched.
        assert_eq!(baseline.curves.columns(), ["gender".to_string()]);
    }

    #[test]
    fn invalid_comparisons_are_rejected() {
        let a = run(0.2);
        let dup = [
            ExperimentInput::from_result_set("a", &a),
            ExperimentInput::from_result_set("a", &a),
        ];
        assert!(compare(&dup, "experiment").is_err());
        assert!(compare(&[], "experiment").is_err());

        let one = [ExperimentInput::from_result_set("a", &a)];
        assert!(compare(&one, "").is_err());
        // Clashes with an attribute column.
        assert!(compare(&one, "gender").is_err());
    }

    #[test]
    fn runs_with_different_attributes_cannot_be_mixed() {
        let a = run(0.2);
        let other = TaggedCurveTable::new(vec!["nat".to_string()]);
        let inputs = [
            ExperimentInput::from_result_set("a", &a),
            ExperimentInput {
                label: "b",
                curves: &other,
                metrics: &[],
            },
        ];
        assert!(matches!(
            compare(&inputs, "experiment"),
            Err(EvalError::InvalidInput(_))
        ));
    }
}
