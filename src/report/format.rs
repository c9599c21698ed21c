//! Terminal tables for evaluation, fairness and comparison runs.
//!
//! Every function returns a `String`; printing is the caller's business.

use crate::compare::ExperimentComparison;
use crate::domain::{
    EvalConfig, Evaluation, FairnessReport, OperatingPoints, SubgroupKey, SubgroupResultSet,
};
use crate::io::ingest::IngestedTrials;

/// Dataset stats, cost parameters and pooled operating points.
pub fn format_eval_summary(ingest: &IngestedTrials, config: &EvalConfig, baseline: &Evaluation) -> String {
    let mut out = String::new();
    let stats = &ingest.stats;

    out.push_str("=== sveva - speaker verification evaluation ===\n");
    out.push_str(&format!("Scores: {}\n", config.scores_path.display()));
    out.push_str(&format!(
        "Trials: n={} | genuine={} | impostor={} | score=[{:.4}, {:.4}]\n",
        stats.n_trials, stats.n_genuine, stats.n_impostor, stats.score_min, stats.score_max
    ));
    if !ingest.row_errors.is_empty() {
        out.push_str(&format!(
            "Skipped rows: {} of {}\n",
            ingest.row_errors.len(),
            ingest.rows_read
        ));
    }
    let c = &baseline.cost;
    out.push_str(&format!(
        "Cost: p_target={} c_fn={} c_fp={}\n",
        c.p_target, c.c_fn, c.c_fp
    ));

    out.push_str("\nPooled:\n");
    out.push_str(&metrics_header("population"));
    out.push_str(&metrics_row("all", &baseline.metrics));
    out
}

/// Per-subgroup metrics followed by the skipped-subgroup diagnostics.
pub fn format_subgroups(results: &SubgroupResultSet) -> String {
    let mut out = String::new();

    out.push_str(&format!("Subgroups by {}:\n", results.attributes.join(" x ")));
    out.push_str(&metrics_header("subgroup"));
    for m in &results.metrics {
        out.push_str(&metrics_row(&m.id, &m.metrics));
    }

    if !results.diagnostics.is_empty() {
        out.push_str("\nDiagnostics:\n");
        for d in &results.diagnostics {
            out.push_str(&format!("  [{}] {}\n", d.key, d.reason));
        }
    }
    out
}

/// Cost and rate differential tables.
pub fn format_fairness(report: &FairnessReport) -> String {
    let mut out = String::new();

    out.push_str("Cost differential (pooled min-cost threshold):\n");
    push_line(
        &mut out,
        format!(
            "{:<24} {:>12} {:>12} {:>12} {:>12}",
            "subgroup", "sg_cost", "sg_min_cost", "overall", "sg"
        ),
    );
    push_line(&mut out, rule(&[24, 12, 12, 12, 12]));
    for r in &report.cost {
        push_line(
            &mut out,
            format!(
                "{:<24} {:>12.6} {:>12.6} {:>12} {:>12}",
                truncate(&r.subgroup, 24),
                r.sg_cost_at_overall_threshold,
                r.sg_min_cost,
                fmt_ratio(r.overall_cdet_diff),
                fmt_ratio(r.sg_cdet_diff),
            ),
        );
    }

    let kind = report
        .rates
        .first()
        .map(|r| r.threshold_kind.field_name())
        .unwrap_or("threshold");
    out.push_str(&format!("\nRate differential ({kind}):\n"));
    push_line(
        &mut out,
        format!(
            "{:<24} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "subgroup", "fpr@pool", "fnr@pool", "fpr_all", "fnr_all", "fpr_sg", "fnr_sg"
        ),
    );
    push_line(&mut out, rule(&[24, 10, 10, 10, 10, 10, 10]));
    for r in &report.rates {
        push_line(
            &mut out,
            format!(
                "{:<24} {:>10.4} {:>10.4} {:>10} {:>10} {:>10} {:>10}",
                truncate(&r.subgroup, 24),
                r.sg_at_pooled.fpr,
                r.sg_at_pooled.fnr,
                fmt_ratio(r.overall_fpr_diff),
                fmt_ratio(r.overall_fnr_diff),
                fmt_ratio(r.sg_fpr_diff),
                fmt_ratio(r.sg_fnr_diff),
            ),
        );
    }
    out
}

/// One row per subgroup, `min_cost / eer%` per run.
pub fn format_comparison(cmp: &ExperimentComparison) -> String {
    let mut keys: Vec<(&SubgroupKey, &str)> = Vec::new();
    for run in &cmp.runs {
        for m in &run.metrics {
            if !keys.iter().any(|(k, _)| *k == &m.key) {
                keys.push((&m.key, m.id.as_str()));
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!("Comparison by {} (min_cost / eer%):\n", cmp.column));

    let mut header = format!("{:<24}", "subgroup");
    for label in cmp.labels() {
        header.push_str(&format!(" {:>20}", truncate(label, 20)));
    }
    push_line(&mut out, header);
    let mut widths = vec![24];
    widths.extend(cmp.runs.iter().map(|_| 20));
    push_line(&mut out, rule(&widths));

    for (key, id) in keys {
        let mut line = format!("{:<24}", truncate(id, 24));
        for run in &cmp.runs {
            let cell = run
                .metrics
                .iter()
                .find(|m| &m.key == key)
                .map(|m| format!("{:.4} / {:.2}", m.metrics.min_cost, m.metrics.eer))
                .unwrap_or_else(|| "-".to_string());
            line.push_str(&format!(" {cell:>20}"));
        }
        push_line(&mut out, line);
    }
    out
}

/// Undefined ratios render as `n/a`.
pub fn fmt_ratio(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.3}"),
        None => "n/a".to_string(),
    }
}

fn metrics_header(first: &str) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<24} {:>10} {:>12} {:>8} {:>12}",
            first, "min_cost", "thr_cost", "eer%", "thr_eer"
        ),
    );
    push_line(&mut out, rule(&[24, 10, 12, 8, 12]));
    out
}

fn metrics_row(name: &str, m: &OperatingPoints) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<24} {:>10.6} {:>12.4} {:>8.2} {:>12.4}",
            truncate(name, 24),
            m.min_cost,
            m.min_cost_threshold,
            m.eer,
            m.eer_threshold
        ),
    );
    out
}

fn rule(widths: &[usize]) -> String {
    widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{ExperimentInput, compare};
    use crate::domain::{CostParams, Trial};
    use crate::subgroup::evaluator::SubgroupEvaluator;

    fn results(shift: f64) -> SubgroupResultSet {
        let mut trials = Vec::new();
        for nat in ["india", "usa"] {
            for i in 0..5 {
                let s = i as f64 / 10.0;
                trials.push(Trial::new(s + shift, 1).with_attr("nat", nat));
                trials.push(Trial::new(s, 0).with_attr("nat", nat));
            }
        }
        trials.push(Trial::new(0.5, 1).with_attr("nat", "uk"));
        SubgroupEvaluator::new(CostParams::default())
            .evaluate(&trials, &["nat".to_string()])
            .unwrap()
    }

    #[test]
    fn ratios_render_na_when_undefined() {
        assert_eq!(fmt_ratio(Some(1.23456)), "1.235");
        assert_eq!(fmt_ratio(None), "n/a");
    }

    #[test]
    fn subgroup_table_lists_metrics_and_diagnostics() {
        let text = format_subgroups(&results(0.3));
        assert!(text.starts_with("Subgroups by nat:"));
        assert!(text.lines().any(|l| l.starts_with("india ")));
        assert!(text.lines().any(|l| l.starts_with("usa ")));
        assert!(text.contains("Diagnostics:"));
        assert!(text.contains("[nat=uk]"));
    }

    #[test]
    fn comparison_has_one_column_per_run() {
        let a = results(0.3);
        let b = results(0.6);
        let cmp = compare(
            &[
                ExperimentInput::from_result_set("before", &a),
                ExperimentInput::from_result_set("after", &b),
            ],
            "experiment",
        )
        .unwrap();
        let text = format_comparison(&cmp);
        let header = text.lines().nth(1).unwrap();
        assert!(header.contains("before") && header.contains("after"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("southafrica_f", 24), "southafrica_f");
        assert_eq!(truncate("abcdef", 4), "abc.");
    }
}
