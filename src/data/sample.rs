//! Synthetic scored-trial generation.
//!
//! Impostor scores are drawn from `N(0, 1)` and genuine scores from
//! `N(separation + shift, 1)`, where `shift` is the sum of every configured
//! shift matching the trial's nationality or nationality/gender group. A
//! negative shift makes a group harder to verify, which is what the fairness
//! reports are meant to surface.

use std::fs::File;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::info;

use crate::domain::{SampleConfig, Trial};
use crate::error::AppError;

pub const NATIONALITIES: [&str; 4] = ["India", "USA", "UK", "South Africa"];
pub const GENDERS: [&str; 2] = ["f", "m"];

const NATIONALITY: &str = "nationality";
const GENDER: &str = "gender";

/// Generate `config.trials` trials, reproducibly for a given seed.
pub fn generate_trials(config: &SampleConfig) -> Result<Vec<Trial>, AppError> {
    validate(config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Score distribution error: {e}")))?;

    // At least one trial of each class, whatever the fraction.
    let n_genuine = ((config.trials as f64 * config.genuine_fraction).round() as usize)
        .clamp(1, config.trials - 1);

    let mut trials = Vec::with_capacity(config.trials);
    for i in 0..config.trials {
        let nationality = NATIONALITIES[rng.gen_range(0..NATIONALITIES.len())];
        let gender = GENDERS[rng.gen_range(0..GENDERS.len())];
        let noise = normal.sample(&mut rng);

        let (score, label) = if i < n_genuine {
            let shift = group_shift(&config.shifts, nationality, gender);
            (config.separation + shift + noise, 1)
        } else {
            (noise, 0)
        };

        trials.push(
            Trial::new(score, label)
                .with_attr(NATIONALITY, nationality)
                .with_attr(GENDER, gender),
        );
    }
    trials.shuffle(&mut rng);

    info!(
        trials = trials.len(),
        genuine = n_genuine,
        seed = config.seed,
        "generated synthetic trials"
    );
    Ok(trials)
}

/// Write trials as `sc,lab,nationality,gender`.
pub fn write_sample_csv(path: &Path, trials: &[Trial]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sample CSV '{}': {e}", path.display())))?;
    let mut w = csv::Writer::from_writer(file);
    let write_err = |e: csv::Error| AppError::new(2, format!("Failed to write sample CSV: {e}"));

    w.write_record(["sc", "lab", NATIONALITY, GENDER])
        .map_err(write_err)?;
    for t in trials {
        w.write_record([
            format!("{:.6}", t.score),
            t.label.to_string(),
            t.attr(NATIONALITY).unwrap_or_default().to_string(),
            t.attr(GENDER).unwrap_or_default().to_string(),
        ])
        .map_err(write_err)?;
    }
    w.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush sample CSV: {e}")))?;
    Ok(())
}

fn validate(config: &SampleConfig) -> Result<(), AppError> {
    if config.trials < 2 {
        return Err(AppError::new(2, "Trial count must be >= 2."));
    }
    if !(config.genuine_fraction > 0.0 && config.genuine_fraction < 1.0) {
        return Err(AppError::new(2, "Genuine fraction must be in (0, 1)."));
    }
    if !config.separation.is_finite() {
        return Err(AppError::new(2, "Score separation must be finite."));
    }
    for (group, delta) in &config.shifts {
        if !delta.is_finite() {
            return Err(AppError::new(2, format!("Shift for '{group}' must be finite.")));
        }
        if !is_known_group(group) {
            return Err(AppError::new(
                2,
                format!(
                    "Unknown shift group '{group}' (expected a nationality of [{}], optionally /f or /m).",
                    NATIONALITIES.join(", ")
                ),
            ));
        }
    }
    Ok(())
}

fn is_known_group(group: &str) -> bool {
    let (nationality, gender) = split_group(group);
    NATIONALITIES.iter().any(|n| n.eq_ignore_ascii_case(nationality))
        && gender.is_none_or(|g| GENDERS.iter().any(|x| x.eq_ignore_ascii_case(g)))
}

fn group_shift(shifts: &[(String, f64)], nationality: &str, gender: &str) -> f64 {
    shifts
        .iter()
        .filter(|(group, _)| {
            let (n, g) = split_group(group);
            n.eq_ignore_ascii_case(nationality) && g.is_none_or(|g| g.eq_ignore_ascii_case(gender))
        })
        .map(|(_, delta)| delta)
        .sum()
}

fn split_group(group: &str) -> (&str, Option<&str>) {
    match group.split_once('/') {
        Some((n, g)) => (n.trim(), Some(g.trim())),
        None => (group.trim(), None),
    }
}
