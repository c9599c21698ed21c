//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during evaluation
//! - exported to JSON/CSV
//! - compared across experiments

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// One verification trial.
///
/// `label` is 1 for a genuine (same speaker) trial and 0 for an impostor trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub score: f64,
    pub label: u8,
    /// Categorical attributes used for subgroup partitioning (e.g. `ref_gender`).
    pub attributes: BTreeMap<String, String>,
}

impl Trial {
    pub fn new(score: f64, label: u8) -> Self {
        Self {
            score,
            label,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Split trials into parallel score/label vectors.
pub fn scores_and_labels(trials: &[Trial]) -> (Vec<f64>, Vec<u8>) {
    trials.iter().map(|t| (t.score, t.label)).unzip()
}

/// One sample of an error curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub fpr: f64,
    pub fnr: f64,
    pub threshold: f64,
}

/// False-positive / false-negative rates across the operating range.
///
/// Rows are sorted by threshold ascending; `fpr` is non-increasing and `fnr`
/// non-decreasing along the rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorCurve {
    points: Vec<CurvePoint>,
}

impl ErrorCurve {
    /// Wrap rows that already satisfy the ordering invariant.
    pub fn from_points(points: Vec<CurvePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurvePoint> {
        self.points.iter()
    }
}

/// Detection cost function parameters (NIST SRE convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParams {
    /// Prior probability of a genuine trial.
    pub p_target: f64,
    /// Cost of a false reject.
    pub c_fn: f64,
    /// Cost of a false accept.
    pub c_fp: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            p_target: 0.05,
            c_fn: 1.0,
            c_fp: 1.0,
        }
    }
}

impl CostParams {
    pub fn validate(&self) -> Result<(), EvalError> {
        if !(self.p_target.is_finite() && self.p_target > 0.0 && self.p_target < 1.0) {
            return Err(EvalError::invalid(format!(
                "p_target must be in (0, 1), got {}",
                self.p_target
            )));
        }
        for (name, value) in [("c_fn", self.c_fn), ("c_fp", self.c_fp)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EvalError::invalid(format!(
                    "{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// `fnr * c_fn * p_target + fpr * c_fp * (1 - p_target)`.
    pub fn cost(&self, fpr: f64, fnr: f64) -> f64 {
        fnr * self.c_fn * self.p_target + fpr * self.c_fp * (1.0 - self.p_target)
    }
}

/// Summary operating points of one curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoints {
    pub min_cost: f64,
    pub min_cost_threshold: f64,
    /// Equal error rate in percent.
    pub eer: f64,
    pub eer_threshold: f64,
}

impl OperatingPoints {
    pub fn threshold(&self, kind: ThresholdKind) -> f64 {
        match kind {
            ThresholdKind::MinCost => self.min_cost_threshold,
            ThresholdKind::Eer => self.eer_threshold,
        }
    }
}

/// Which operating threshold a rate comparison is anchored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdKind {
    /// Threshold of the minimum detection cost.
    MinCost,
    /// Threshold of the equal error rate.
    Eer,
}

impl ThresholdKind {
    pub fn field_name(self) -> &'static str {
        match self {
            ThresholdKind::MinCost => "min_cost_threshold",
            ThresholdKind::Eer => "eer_threshold",
        }
    }
}

/// `(fpr, fnr)` read off a curve at some threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePair {
    pub fpr: f64,
    pub fnr: f64,
}

/// Curve + operating points of one population, with the cost parameters used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub curve: ErrorCurve,
    pub metrics: OperatingPoints,
    pub cost: CostParams,
}

/// Identifies one subgroup: an ordered list of `(attribute, value)` pairs.
///
/// Order follows the attribute order the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubgroupKey {
    entries: Vec<(String, String)>,
}

impl SubgroupKey {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, value)| value.as_str())
    }

    /// Display identifier: lowercased values with whitespace removed, joined by `_`.
    ///
    /// Not guaranteed unique (`"South Africa"` and `"southafrica"` collide);
    /// lookups that must be exact use the key itself.
    pub fn id(&self) -> String {
        self.values()
            .map(|v| {
                v.chars()
                    .filter(|c| !c.is_whitespace())
                    .flat_map(char::to_lowercase)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Exact match on every attribute of the key.
    pub fn matches(&self, trial: &Trial) -> bool {
        self.entries
            .iter()
            .all(|(name, value)| trial.attr(name) == Some(value.as_str()))
    }
}

impl std::fmt::Display for SubgroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// A curve row carrying tag values aligned with the table's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedCurveRow {
    pub tags: Vec<String>,
    pub point: CurvePoint,
}

/// Several curves concatenated into one table, each row tagged with the
/// attribute values (and, after aggregation, experiment label) it came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaggedCurveTable {
    columns: Vec<String>,
    rows: Vec<TaggedCurveRow>,
}

impl TaggedCurveTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[TaggedCurveRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append every row of `curve`, tagged with `tags` (one value per column).
    pub fn push_curve(&mut self, tags: &[String], curve: &ErrorCurve) -> Result<(), EvalError> {
        if tags.len() != self.columns.len() {
            return Err(EvalError::invalid(format!(
                "expected {} tag values, got {}",
                self.columns.len(),
                tags.len()
            )));
        }
        self.rows.extend(curve.iter().map(|&point| TaggedCurveRow {
            tags: tags.to_vec(),
            point,
        }));
        Ok(())
    }

    /// Append the rows of a table with identical columns.
    pub fn append(&mut self, other: &TaggedCurveTable) -> Result<(), EvalError> {
        if other.columns != self.columns {
            return Err(EvalError::invalid(format!(
                "cannot concatenate tables with columns [{}] and [{}]",
                self.columns.join(", "),
                other.columns.join(", ")
            )));
        }
        self.rows.extend(other.rows.iter().cloned());
        Ok(())
    }

    /// Copy of this table with one more column holding `value` on every row.
    pub fn with_column(&self, name: &str, value: &str) -> Result<TaggedCurveTable, EvalError> {
        if self.columns.iter().any(|c| c == name) {
            return Err(EvalError::invalid(format!("column '{name}' already exists")));
        }
        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut tags = row.tags.clone();
                tags.push(value.to_string());
                TaggedCurveRow {
                    tags,
                    point: row.point,
                }
            })
            .collect();
        Ok(TaggedCurveTable { columns, rows })
    }

    /// The curve of rows whose tags match every entry of `key` exactly.
    ///
    /// A key attribute that is not a column of this table matches nothing.
    pub fn select(&self, key: &SubgroupKey) -> ErrorCurve {
        let mut wanted = Vec::with_capacity(key.entries().len());
        for (name, value) in key.entries() {
            let Some(idx) = self.columns.iter().position(|c| c == name) else {
                return ErrorCurve::default();
            };
            wanted.push((idx, value.as_str()));
        }
        let points = self
            .rows
            .iter()
            .filter(|row| wanted.iter().all(|&(idx, value)| row.tags[idx] == value))
            .map(|row| row.point)
            .collect();
        ErrorCurve::from_points(points)
    }
}

/// Operating points of one subgroup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupMetrics {
    pub id: String,
    pub key: SubgroupKey,
    pub metrics: OperatingPoints,
}

/// Why a subgroup combination produced no metrics (or needs attention).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// No trial matches the filter.
    Empty,
    /// Curve or operating-point computation failed (e.g. single-class subgroup).
    Failed { message: String },
    /// Kept, but its display id equals the id of an earlier subgroup.
    IdCollision { with: SubgroupKey },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "no matching trials"),
            SkipReason::Failed { message } => write!(f, "{message}"),
            SkipReason::IdCollision { with } => write!(f, "identifier collides with [{with}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupDiagnostic {
    pub key: SubgroupKey,
    pub reason: SkipReason,
}

/// Output of subgroup evaluation.
///
/// Every key in `metrics` has rows in `curves` and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupResultSet {
    pub attributes: Vec<String>,
    pub cost: CostParams,
    pub curves: TaggedCurveTable,
    /// In enumeration order.
    pub metrics: Vec<SubgroupMetrics>,
    pub diagnostics: Vec<SubgroupDiagnostic>,
}

impl SubgroupResultSet {
    /// First subgroup whose display id is `id`.
    pub fn get(&self, id: &str) -> Option<&OperatingPoints> {
        self.metrics.iter().find(|m| m.id == id).map(|m| &m.metrics)
    }

    pub fn get_key(&self, key: &SubgroupKey) -> Option<&OperatingPoints> {
        self.metrics.iter().find(|m| &m.key == key).map(|m| &m.metrics)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.id.as_str())
    }
}

/// Cost differential of one subgroup against the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostDifferentialRow {
    pub subgroup: String,
    pub key: SubgroupKey,
    /// Subgroup cost at the baseline's minimum-cost threshold.
    pub sg_cost_at_overall_threshold: f64,
    pub sg_min_cost: f64,
    /// `sg_cost_at_overall_threshold / baseline.min_cost`.
    pub overall_cdet_diff: Option<f64>,
    /// `sg_min_cost / sg_cost_at_overall_threshold`.
    pub sg_cdet_diff: Option<f64>,
}

/// Rate differential of one subgroup against the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateDifferentialRow {
    pub subgroup: String,
    pub key: SubgroupKey,
    pub threshold_kind: ThresholdKind,
    pub pooled_threshold: f64,
    pub sg_threshold: f64,
    /// Pooled population rates at the pooled threshold.
    pub pooled: RatePair,
    /// Subgroup rates at the pooled threshold.
    pub sg_at_pooled: RatePair,
    /// Subgroup rates at its own threshold.
    pub sg_at_own: RatePair,
    pub overall_fpr_diff: Option<f64>,
    pub overall_fnr_diff: Option<f64>,
    pub sg_fpr_diff: Option<f64>,
    pub sg_fnr_diff: Option<f64>,
}

/// Fairness differentials for every subgroup of one result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    pub cost: Vec<CostDifferentialRow>,
    pub rates: Vec<RateDifferentialRow>,
}

/// A full `sveva evaluate` run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub scores_path: PathBuf,
    /// Subgroup attributes, outermost first.
    pub attributes: Vec<String>,
    pub cost: CostParams,
    pub threshold_kind: ThresholdKind,

    pub export_curve: Option<PathBuf>,
    pub export_fairness: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Configuration of `sveva compare`.
#[derive(Debug, Clone)]
pub struct CompareConfig {
    /// `(label, scores CSV)` in command-line order.
    pub runs: Vec<(String, PathBuf)>,
    pub attributes: Vec<String>,
    pub cost: CostParams,
    /// Name of the column that holds the experiment label.
    pub column: String,

    pub export_curve: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Configuration of the synthetic trial generator.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub out: PathBuf,
    pub trials: usize,
    pub seed: u64,
    /// Fraction of trials that are genuine.
    pub genuine_fraction: f64,
    /// Distance between genuine and impostor score means (in impostor std devs).
    pub separation: f64,
    /// Per-group shift of the genuine score mean; group is `nationality` or
    /// `nationality/gender` (matched case-insensitively).
    pub shifts: Vec<(String, f64)>,
}
