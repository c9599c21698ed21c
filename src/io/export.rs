//! Export curve tables and fairness differentials to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or plotting
//! scripts: one row per curve sample or per subgroup, undefined ratios left
//! empty.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{FairnessReport, TaggedCurveTable};
use crate::error::AppError;

/// Write a tagged curve table (`fnrs,fprs,thresholds,<tag columns>`).
pub fn write_curve_csv(path: &Path, table: &TaggedCurveTable) -> Result<(), AppError> {
    let file = create(path)?;
    write_curve_table(file, table)
}

/// Write one row per subgroup joining its cost and rate differentials.
pub fn write_fairness_csv(path: &Path, report: &FairnessReport) -> Result<(), AppError> {
    let file = create(path)?;
    write_fairness_table(file, report)
}

pub fn write_curve_table<W: Write>(writer: W, table: &TaggedCurveTable) -> Result<(), AppError> {
    let mut w = csv::Writer::from_writer(writer);

    let mut header = vec!["fnrs".to_string(), "fprs".to_string(), "thresholds".to_string()];
    header.extend(table.columns().iter().cloned());
    w.write_record(&header).map_err(write_err)?;

    for row in table.rows() {
        let p = &row.point;
        let mut record = vec![fmt_f(p.fnr), fmt_f(p.fpr), fmt_f(p.threshold)];
        record.extend(row.tags.iter().cloned());
        w.write_record(&record).map_err(write_err)?;
    }
    w.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush curve CSV: {e}")))?;
    Ok(())
}

pub fn write_fairness_table<W: Write>(writer: W, report: &FairnessReport) -> Result<(), AppError> {
    if report.cost.len() != report.rates.len() {
        return Err(AppError::new(
            4,
            "Cost and rate differentials cover different subgroups.",
        ));
    }
    let mut w = csv::Writer::from_writer(writer);
    w.write_record([
        "subgroup",
        "sg_cost_at_overall_threshold",
        "sg_min_cost",
        "overall_cdet_diff",
        "sg_cdet_diff",
        "threshold_kind",
        "pooled_threshold",
        "sg_threshold",
        "pooled_fpr",
        "pooled_fnr",
        "sg_fpr_at_pooled",
        "sg_fnr_at_pooled",
        "sg_fpr_at_own",
        "sg_fnr_at_own",
        "overall_fpr_diff",
        "overall_fnr_diff",
        "sg_fpr_diff",
        "sg_fnr_diff",
    ])
    .map_err(write_err)?;

    for (c, r) in report.cost.iter().zip(&report.rates) {
        if c.key != r.key {
            return Err(AppError::new(
                4,
                format!("Differential rows out of step: [{}] vs [{}].", c.key, r.key),
            ));
        }
        w.write_record([
            c.subgroup.clone(),
            fmt_f(c.sg_cost_at_overall_threshold),
            fmt_f(c.sg_min_cost),
            fmt_opt(c.overall_cdet_diff),
            fmt_opt(c.sg_cdet_diff),
            r.threshold_kind.field_name().to_string(),
            fmt_f(r.pooled_threshold),
            fmt_f(r.sg_threshold),
            fmt_f(r.pooled.fpr),
            fmt_f(r.pooled.fnr),
            fmt_f(r.sg_at_pooled.fpr),
            fmt_f(r.sg_at_pooled.fnr),
            fmt_f(r.sg_at_own.fpr),
            fmt_f(r.sg_at_own.fnr),
            fmt_opt(r.overall_fpr_diff),
            fmt_opt(r.overall_fnr_diff),
            fmt_opt(r.sg_fpr_diff),
            fmt_opt(r.sg_fnr_diff),
        ])
        .map_err(write_err)?;
    }
    w.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush fairness CSV: {e}")))?;
    Ok(())
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_err(e: csv::Error) -> AppError {
    AppError::new(2, format!("Failed to write export CSV row: {e}"))
}

fn fmt_f(v: f64) -> String {
    format!("{v:.10}")
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_f).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::operating::evaluate_population;
    use crate::domain::{CostParams, SubgroupKey, ThresholdKind, Trial, scores_and_labels};
    use crate::fairness::fairness_report;
    use crate::subgroup::evaluator::SubgroupEvaluator;

    fn trials() -> Vec<Trial> {
        let mut out = Vec::new();
        for (g, shift) in [("f", 0.0), ("m", 0.15)] {
            for i in 0..5 {
                let s = i as f64 / 10.0;
                out.push(Trial::new(s + 0.3 + shift, 1).with_attr("gender", g));
                out.push(Trial::new(s, 0).with_attr("gender", g));
            }
        }
        out
    }

    #[test]
    fn curve_csv_has_tag_columns() {
        let results = SubgroupEvaluator::new(CostParams::default())
            .evaluate(&trials(), &["gender".to_string()])
            .unwrap();
        let mut buf = Vec::new();
        write_curve_table(&mut buf, &results.curves).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("fnrs,fprs,thresholds,gender"));
        assert_eq!(text.lines().count(), results.curves.len() + 1);
        assert!(text.lines().skip(1).all(|l| l.ends_with(",f") || l.ends_with(",m")));
    }

    #[test]
    fn fairness_csv_leaves_undefined_ratios_empty() {
        let trials = trials();
        let cost = CostParams::default();
        let results = SubgroupEvaluator::new(cost)
            .evaluate(&trials, &["gender".to_string()])
            .unwrap();
        let (scores, labels) = scores_and_labels(&trials);
        let baseline = evaluate_population(&scores, &labels, &cost).unwrap();
        let mut report = fairness_report(&results, &baseline, ThresholdKind::Eer).unwrap();
        report.cost[0].overall_cdet_diff = None;

        let mut buf = Vec::new();
        write_fairness_table(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let rows: Vec<&str> = text.lines().collect();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("subgroup,sg_cost_at_overall_threshold"));
        let fields: Vec<&str> = rows[1].split(',').collect();
        assert_eq!(fields[0], "f");
        assert_eq!(fields[3], "");
        assert_eq!(fields[5], "eer_threshold");
    }

    #[test]
    fn misaligned_differentials_are_rejected() {
        let trials = trials();
        let cost = CostParams::default();
        let results = SubgroupEvaluator::new(cost)
            .evaluate(&trials, &["gender".to_string()])
            .unwrap();
        let (scores, labels) = scores_and_labels(&trials);
        let baseline = evaluate_population(&scores, &labels, &cost).unwrap();
        let mut report = fairness_report(&results, &baseline, ThresholdKind::MinCost).unwrap();
        report.rates[0].key = SubgroupKey::new(vec![("gender".to_string(), "x".to_string())]);

        let err = write_fairness_table(Vec::new(), &report).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.csv");
        write_curve_csv(&path, &TaggedCurveTable::new(vec!["nat".to_string()])).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim(), "fnrs,fprs,thresholds,nat");
    }
}
