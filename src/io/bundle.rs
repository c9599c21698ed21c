//! JSON result bundles.
//!
//! A bundle is the portable record of one run:
//! - tool name + generation timestamp
//! - cost parameters used for every number in it
//! - pooled and per-subgroup operating points, skip diagnostics
//! - fairness differentials when subgroups were requested

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::compare::{ExperimentComparison, ExperimentMetrics};
use crate::domain::{
    CostParams, Evaluation, FairnessReport, OperatingPoints, SubgroupDiagnostic, SubgroupMetrics,
    SubgroupResultSet,
};
use crate::error::AppError;

const TOOL: &str = "sveva";

/// Bundle written by `sveva evaluate --export-json`.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationBundle {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub cost: CostParams,
    pub pooled: OperatingPoints,
    pub attributes: Vec<String>,
    pub subgroups: Vec<SubgroupMetrics>,
    pub diagnostics: Vec<SubgroupDiagnostic>,
    pub fairness: Option<FairnessReport>,
}

impl EvaluationBundle {
    pub fn new(
        source: &Path,
        baseline: &Evaluation,
        subgroups: Option<&SubgroupResultSet>,
        fairness: Option<&FairnessReport>,
    ) -> Self {
        Self {
            tool: TOOL.to_string(),
            generated_at: Utc::now(),
            source: source.display().to_string(),
            cost: baseline.cost,
            pooled: baseline.metrics,
            attributes: subgroups.map(|s| s.attributes.clone()).unwrap_or_default(),
            subgroups: subgroups.map(|s| s.metrics.clone()).unwrap_or_default(),
            diagnostics: subgroups.map(|s| s.diagnostics.clone()).unwrap_or_default(),
            fairness: fairness.cloned(),
        }
    }
}

/// Bundle written by `sveva compare --export-json`.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonBundle {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub cost: CostParams,
    pub column: String,
    pub runs: Vec<ExperimentMetrics>,
}

impl ComparisonBundle {
    pub fn new(comparison: &ExperimentComparison, cost: CostParams) -> Self {
        Self {
            tool: TOOL.to_string(),
            generated_at: Utc::now(),
            cost,
            column: comparison.column.clone(),
            runs: comparison.runs.clone(),
        }
    }
}

/// Write any bundle as pretty-printed JSON.
pub fn write_bundle_json<T: Serialize>(path: &Path, bundle: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, bundle)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON: {e}")))?;
    Ok(())
}
