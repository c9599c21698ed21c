//! Command-line parsing for the speaker verification evaluator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the evaluation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ThresholdKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "sveva",
    version,
    about = "Speaker verification evaluation with subgroup fairness"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a scored trial list: pooled metrics, subgroups and fairness differentials.
    Evaluate(EvaluateArgs),
    /// Evaluate several runs on the same subgroups and compare them side by side.
    Compare(CompareArgs),
    /// Write a synthetic scored trial list (for demos and smoke tests).
    Sample(SampleArgs),
}

/// Detection cost parameters.
#[derive(Debug, Args, Clone)]
pub struct CostArgs {
    /// Prior probability of a genuine trial.
    #[arg(long, default_value_t = 0.05)]
    pub p_target: f64,

    /// Cost of a false reject.
    #[arg(long, default_value_t = 1.0)]
    pub c_fn: f64,

    /// Cost of a false accept.
    #[arg(long, default_value_t = 1.0)]
    pub c_fp: f64,
}

#[derive(Debug, Parser, Clone)]
pub struct EvaluateArgs {
    /// Scored trial CSV (`sc`, `lab` and attribute columns).
    #[arg(short = 's', long, value_name = "CSV")]
    pub scores: PathBuf,

    /// Subgroup attribute column; repeat for combinations (outermost first).
    #[arg(long = "by", value_name = "ATTR")]
    pub by: Vec<String>,

    #[command(flatten)]
    pub cost: CostArgs,

    /// Threshold the rate differentials are anchored at.
    #[arg(long, value_enum, default_value_t = ThresholdKind::MinCost)]
    pub threshold: ThresholdKind,

    /// Export subgroup curves (fnrs, fprs, thresholds + attribute tags) to CSV.
    #[arg(long = "export-curve", value_name = "CSV")]
    pub export_curve: Option<PathBuf>,

    /// Export per-subgroup fairness differentials to CSV.
    #[arg(long = "export-fairness", value_name = "CSV")]
    pub export_fairness: Option<PathBuf>,

    /// Export all results to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct CompareArgs {
    /// Run to compare, as LABEL=CSV; repeat for each run.
    #[arg(long = "run", value_name = "LABEL=CSV", value_parser = parse_run, required = true)]
    pub runs: Vec<(String, PathBuf)>,

    /// Subgroup attribute column; repeat for combinations (outermost first).
    #[arg(long = "by", value_name = "ATTR", required = true)]
    pub by: Vec<String>,

    #[command(flatten)]
    pub cost: CostArgs,

    /// Name of the column holding the run label in exported curves.
    #[arg(long, default_value = "experiment")]
    pub column: String,

    /// Export the concatenated, run-tagged curves to CSV.
    #[arg(long = "export-curve", value_name = "CSV")]
    pub export_curve: Option<PathBuf>,

    /// Export per-run subgroup metrics to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub out: PathBuf,

    /// Number of trials to generate.
    #[arg(short = 'n', long, default_value_t = 2000)]
    pub trials: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of genuine trials.
    #[arg(long, default_value_t = 0.5)]
    pub genuine_fraction: f64,

    /// Distance between genuine and impostor score means.
    #[arg(long, default_value_t = 3.0)]
    pub separation: f64,

    /// Genuine score shift for NATIONALITY or NATIONALITY/GENDER, as GROUP=DELTA.
    #[arg(long = "shift", value_name = "GROUP=DELTA", value_parser = parse_shift)]
    pub shifts: Vec<(String, f64)>,
}

fn parse_run(s: &str) -> Result<(String, PathBuf), String> {
    let (label, path) = split_pair(s, "LABEL=CSV")?;
    Ok((label.to_string(), PathBuf::from(path)))
}

fn parse_shift(s: &str) -> Result<(String, f64), String> {
    let (group, delta) = split_pair(s, "GROUP=DELTA")?;
    let delta = delta
        .parse::<f64>()
        .map_err(|_| format!("invalid shift '{delta}' (expected a number)"))?;
    Ok((group.to_string(), delta))
}

fn split_pair<'a>(s: &'a str, expected: &str) -> Result<(&'a str, &'a str), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() && !v.trim().is_empty() => Ok((k.trim(), v.trim())),
        _ => Err(format!("expected {expected}, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_collects_repeated_attributes() {
        let cli = Cli::try_parse_from([
            "sveva", "evaluate", "--scores", "s.csv", "--by", "nationality", "--by", "gender",
            "--threshold", "eer", "--p-target", "0.01",
        ])
        .unwrap();
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.by, vec!["nationality", "gender"]);
        assert_eq!(args.threshold, ThresholdKind::Eer);
        assert_eq!(args.cost.p_target, 0.01);
        assert_eq!(args.cost.c_fn, 1.0);
    }

    #[test]
    fn compare_parses_labelled_runs() {
        let cli = Cli::try_parse_from([
            "sveva", "compare", "--run", "base=a.csv", "--run", "new = b.csv", "--by", "gender",
        ])
        .unwrap();
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(
            args.runs,
            vec![
                ("base".to_string(), PathBuf::from("a.csv")),
                ("new".to_string(), PathBuf::from("b.csv")),
            ]
        );
        assert_eq!(args.column, "experiment");
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert!(parse_run("a.csv").is_err());
        assert!(parse_run("=a.csv").is_err());
        assert!(parse_shift("india=lots").is_err());
        assert_eq!(parse_shift("uk/f=-0.5").unwrap(), ("uk/f".to_string(), -0.5));
    }
}
