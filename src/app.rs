//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments into run configs
//! - runs the evaluation/comparison pipelines
//! - prints reports
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, CompareArgs, CostArgs, EvaluateArgs, SampleArgs};
use crate::domain::{CompareConfig, CostParams, EvalConfig, SampleConfig};
use crate::error::AppError;
use crate::io::bundle::{ComparisonBundle, EvaluationBundle, write_bundle_json};

pub mod pipeline;

/// Entry point for the `sveva` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Evaluate(args) => handle_evaluate(&args),
        Command::Compare(args) => handle_compare(&args),
        Command::Sample(args) => handle_sample(&args),
    }
}

fn handle_evaluate(args: &EvaluateArgs) -> Result<(), AppError> {
    let config = eval_config_from_args(args)?;
    let run = pipeline::run_evaluate(&config)?;

    println!(
        "{}",
        crate::report::format_eval_summary(&run.ingest, &config, &run.baseline)
    );
    if let Some(subgroups) = &run.subgroups {
        println!("{}", crate::report::format_subgroups(subgroups));
    }
    if let Some(fairness) = &run.fairness {
        println!("{}", crate::report::format_fairness(fairness));
    }

    // Optional exports.
    if let Some(path) = &config.export_curve {
        match &run.subgroups {
            Some(subgroups) => crate::io::export::write_curve_csv(path, &subgroups.curves)?,
            None => crate::io::export::write_curve_csv(path, &run.pooled_curve_table()?)?,
        }
        info!(path = %path.display(), "wrote curve CSV");
    }
    if let Some(path) = &config.export_fairness {
        let fairness = run.fairness.as_ref().ok_or_else(|| {
            AppError::new(2, "--export-fairness needs at least one evaluable subgroup (--by ATTR).")
        })?;
        crate::io::export::write_fairness_csv(path, fairness)?;
        info!(path = %path.display(), "wrote fairness CSV");
    }
    if let Some(path) = &config.export_json {
        let bundle = EvaluationBundle::new(
            &config.scores_path,
            &run.baseline,
            run.subgroups.as_ref(),
            run.fairness.as_ref(),
        );
        write_bundle_json(path, &bundle)?;
        info!(path = %path.display(), "wrote JSON bundle");
    }

    Ok(())
}

fn handle_compare(args: &CompareArgs) -> Result<(), AppError> {
    let config = compare_config_from_args(args)?;
    let run = pipeline::run_compare(&config)?;

    println!("{}", crate::report::format_comparison(&run.comparison));

    if let Some(path) = &config.export_curve {
        crate::io::export::write_curve_csv(path, &run.comparison.curves)?;
        info!(path = %path.display(), "wrote comparison curve CSV");
    }
    if let Some(path) = &config.export_json {
        write_bundle_json(path, &ComparisonBundle::new(&run.comparison, config.cost))?;
        info!(path = %path.display(), "wrote JSON bundle");
    }
    Ok(())
}

fn handle_sample(args: &SampleArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(args);
    let trials = crate::data::generate_trials(&config)?;
    crate::data::write_sample_csv(&config.out, &trials)?;
    println!("Wrote {} trials to {}", trials.len(), config.out.display());
    Ok(())
}

pub fn eval_config_from_args(args: &EvaluateArgs) -> Result<EvalConfig, AppError> {
    Ok(EvalConfig {
        scores_path: args.scores.clone(),
        attributes: args.by.clone(),
        cost: cost_from_args(&args.cost)?,
        threshold_kind: args.threshold,
        export_curve: args.export_curve.clone(),
        export_fairness: args.export_fairness.clone(),
        export_json: args.export_json.clone(),
    })
}

pub fn compare_config_from_args(args: &CompareArgs) -> Result<CompareConfig, AppError> {
    Ok(CompareConfig {
        runs: args.runs.clone(),
        attributes: args.by.clone(),
        cost: cost_from_args(&args.cost)?,
        column: args.column.clone(),
        export_curve: args.export_curve.clone(),
        export_json: args.export_json.clone(),
    })
}

pub fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    SampleConfig {
        out: args.out.clone(),
        trials: args.trials,
        seed: args.seed,
        genuine_fraction: args.genuine_fraction,
        separation: args.separation,
        shifts: args.shifts.clone(),
    }
}

fn cost_from_args(args: &CostArgs) -> Result<CostParams, AppError> {
    let cost = CostParams {
        p_target: args.p_target,
        c_fn: args.c_fn,
        c_fp: args.c_fp,
    };
    cost.validate()?;
    Ok(cost)
}
