//! CSV ingest and normalization.
//!
//! This module is responsible for turning a scored trial list CSV into clean
//! `Trial`s that are safe to evaluate.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (rows keep file order)
//! - **Separation of concerns**: no evaluation logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::Trial;
use crate::error::AppError;

const SCORE_COLUMNS: [&str; 2] = ["sc", "score"];
const LABEL_COLUMNS: [&str; 2] = ["lab", "label"];

/// Summary stats about the trials actually loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_trials: usize,
    pub n_genuine: usize,
    pub n_impostor: usize,
    pub score_min: f64,
    pub score_max: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: trials + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedTrials {
    pub trials: Vec<Trial>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load trials from a CSV file, keeping the requested attribute columns.
pub fn load_trials(path: &Path, attributes: &[String]) -> Result<IngestedTrials, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let ingested = read_trials(file, attributes)?;

    info!(
        path = %path.display(),
        trials = ingested.stats.n_trials,
        genuine = ingested.stats.n_genuine,
        impostor = ingested.stats.n_impostor,
        row_errors = ingested.row_errors.len(),
        "loaded trials"
    );
    Ok(ingested)
}

/// Parse trials from any CSV reader (headers required).
pub fn read_trials<R: Read>(reader: R, attributes: &[String]) -> Result<IngestedTrials, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let score_idx = find_column(&header_map, &SCORE_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `sc` (or `score`)"))?;
    let label_idx = find_column(&header_map, &LABEL_COLUMNS)
        .ok_or_else(|| AppError::new(2, "Missing required column: `lab` (or `label`)"))?;

    let mut attribute_idx = Vec::with_capacity(attributes.len());
    for name in attributes {
        let idx = header_map.get(&normalize_header_name(name)).ok_or_else(|| {
            AppError::new(2, format!("Subgroup attribute `{name}` is not a column of the CSV."))
        })?;
        attribute_idx.push((name.clone(), *idx));
    }

    let mut trials = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header line, and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, score_idx, label_idx, &attribute_idx) {
            Ok(trial) => trials.push(trial),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in row_errors.iter().take(5) {
        warn!(line = err.line, "{}", err.message);
    }
    if row_errors.len() > 5 {
        warn!("{} more rows skipped", row_errors.len() - 5);
    }

    let stats = compute_stats(&trials)
        .ok_or_else(|| AppError::new(3, "No valid trials remain after validation."))?;

    Ok(IngestedTrials {
        trials,
        stats,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| header_map.get(*n).copied())
}

fn parse_row(
    record: &StringRecord,
    score_idx: usize,
    label_idx: usize,
    attribute_idx: &[(String, usize)],
) -> Result<Trial, String> {
    let score_raw = get_value(record, score_idx).ok_or_else(|| "Missing score value.".to_string())?;
    let score = score_raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Invalid score '{score_raw}'."))?;

    let label_raw = get_value(record, label_idx).ok_or_else(|| "Missing label value.".to_string())?;
    let label = parse_label(label_raw)?;

    let mut trial = Trial::new(score, label);
    for (name, idx) in attribute_idx {
        if let Some(value) = get_value(record, *idx) {
            trial = trial.with_attr(name.clone(), value);
        }
    }
    Ok(trial)
}

fn parse_label(s: &str) -> Result<u8, String> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Ok(1),
        "0" | "0.0" | "false" => Ok(0),
        _ => Err(format!("Invalid label '{s}' (expected 0/1 or true/false).")),
    }
}

fn get_value(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn compute_stats(trials: &[Trial]) -> Option<DatasetStats> {
    if trials.is_empty() {
        return None;
    }
    let n_genuine = trials.iter().filter(|t| t.label == 1).count();
    let (score_min, score_max) = trials
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
            (lo.min(t.score), hi.max(t.score))
        });

    Some(DatasetStats {
        n_trials: trials.len(),
        n_genuine,
        n_impostor: trials.len() - n_genuine,
        score_min,
        score_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reads_scores_labels_and_attributes() {
        let csv = "\u{feff}SC,lab,ref_nationality,ref_gender\n\
                   0.9,1,South Africa,f\n\
                   0.2,0,India,m\n";
        let out = read_trials(csv.as_bytes(), &attrs(&["ref_nationality", "ref_gender"])).unwrap();

        assert_eq!(out.trials.len(), 2);
        assert_eq!(out.trials[0].score, 0.9);
        assert_eq!(out.trials[0].attr("ref_nationality"), Some("South Africa"));
        assert_eq!(out.stats.n_genuine, 1);
        assert_eq!(out.stats.score_min, 0.2);
        assert!(out.row_errors.is_empty());
    }

    #[test]
    fn bad_rows_are_skipped_with_line_numbers() {
        let csv = "score,label,g\n\
                   0.9,1,f\n\
                   abc,0,m\n\
                   0.4,2,m\n\
                   0.3,false,\n";
        let out = read_trials(csv.as_bytes(), &attrs(&["g"])).unwrap();

        assert_eq!(out.rows_read, 4);
        assert_eq!(out.trials.len(), 2);
        let lines: Vec<usize> = out.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4]);
        // Empty attribute cell leaves the attribute unset.
        assert_eq!(out.trials[1].attr("g"), None);
        assert_eq!(out.trials[1].label, 0);
    }

    #[test]
    fn missing_columns_are_usage_errors() {
        let err = read_trials("x,lab\n1,1\n".as_bytes(), &[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = read_trials("sc,lab\n1,1\n".as_bytes(), &attrs(&["gender"])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_valid_rows_is_a_data_error() {
        let err = read_trials("sc,lab\nx,1\n".as_bytes(), &[]).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
