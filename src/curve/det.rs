//! Detection error tradeoff (DET) curve construction.
//!
//! A trial is accepted at threshold `t` when `score >= t`, so for every
//! distinct score value `t`:
//!
//! - `fpr(t) = #{impostor: score >= t} / #impostor`
//! - `fnr(t) = #{genuine:  score <  t} / #genuine`
//!
//! The curve is truncated to the useful range: it starts at the last
//! threshold where false positives are still at their minimum and stops at
//! the first threshold where false negatives reach zero. Rows are returned
//! with thresholds ascending.

use crate::domain::{CurvePoint, ErrorCurve};
use crate::error::EvalError;

/// Source of error curves for a set of scored trials.
///
/// `DetCurve` is the default; other estimators (e.g. a convex-hull ROC) can be
/// plugged into subgroup evaluation through this trait.
pub trait CurveEstimator: Sync {
    fn curve(&self, scores: &[f64], labels: &[u8]) -> Result<ErrorCurve, EvalError>;
}

/// Empirical DET curve over every distinct score.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetCurve;

impl CurveEstimator for DetCurve {
    fn curve(&self, scores: &[f64], labels: &[u8]) -> Result<ErrorCurve, EvalError> {
        compute(scores, labels)
    }
}

/// Compute the DET curve of `scores` against binary `labels`.
pub fn compute(scores: &[f64], labels: &[u8]) -> Result<ErrorCurve, EvalError> {
    let (n_pos, n_neg) = count_classes(scores, labels)?;

    // Descending by score; ties are grouped below so their order is irrelevant.
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // Cumulative counts at the last index of every distinct score.
    let mut tps = Vec::new();
    let mut fps = Vec::new();
    let mut thresholds = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);
    for (i, &idx) in order.iter().enumerate() {
        if labels[idx] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_value = order
            .get(i + 1)
            .is_none_or(|&next| scores[next] != scores[idx]);
        if last_of_value {
            tps.push(tp);
            fps.push(fp);
            thresholds.push(scores[idx]);
        }
    }

    // `fps` is non-decreasing, so this is the last index still at its minimum.
    let first = fps.iter().take_while(|&&f| f == fps[0]).count() - 1;
    // Every genuine trial is accepted from here on (always exists: tp ends at n_pos).
    let last = tps.iter().position(|&t| t == n_pos).unwrap_or(tps.len() - 1);

    let points = (first..=last)
        .rev()
        .map(|i| CurvePoint {
            fpr: fps[i] as f64 / n_neg as f64,
            fnr: (n_pos - tps[i]) as f64 / n_pos as f64,
            threshold: thresholds[i],
        })
        .collect();

    Ok(ErrorCurve::from_points(points))
}

/// Validate inputs and return `(genuine, impostor)` counts.
fn count_classes(scores: &[f64], labels: &[u8]) -> Result<(usize, usize), EvalError> {
    if scores.is_empty() {
        return Err(EvalError::invalid("no scores"));
    }
    if scores.len() != labels.len() {
        return Err(EvalError::invalid(format!(
            "{} scores but {} labels",
            scores.len(),
            labels.len()
        )));
    }
    if let Some(bad) = labels.iter().find(|&&l| l > 1) {
        return Err(EvalError::invalid(format!("label {bad} is not 0 or 1")));
    }
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(EvalError::invalid(format!("non-finite score {bad}")));
    }

    let genuine = labels.iter().filter(|&&l| l == 1).count();
    let impostor = labels.len() - genuine;
    if genuine == 0 || impostor == 0 {
        return Err(EvalError::DegenerateLabels { genuine, impostor });
    }
    Ok((genuine, impostor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn perfectly_separated_scores_give_zero_error_row() {
        let curve = compute(&[0.9, 0.8, 0.3, 0.2], &[1, 1, 0, 0]).unwrap();
        assert_eq!(
            curve.points(),
            [CurvePoint {
                fpr: 0.0,
                fnr: 0.0,
                threshold: 0.8
            }]
        );
    }

    #[test]
    fn overlapping_scores_cover_the_operating_range() {
        // genuine: 0.9, 0.4 ; impostor: 0.6, 0.1
        let curve = compute(&[0.9, 0.6, 0.4, 0.1], &[1, 0, 1, 0]).unwrap();
        let thresholds: Vec<f64> = curve.iter().map(|p| p.threshold).collect();
        assert_eq!(thresholds, vec![0.4, 0.6, 0.9]);

        // At 0.6: accept 0.9 (genuine) and 0.6 (impostor).
        let at_06 = curve.points()[1];
        assert_eq!(at_06.fpr, 0.5);
        assert_eq!(at_06.fnr, 0.5);

        // At 0.4 every genuine trial is accepted.
        assert_eq!(curve.points()[0].fnr, 0.0);
        assert_eq!(curve.points()[0].fpr, 0.5);
    }

    #[test]
    fn tied_scores_share_one_threshold() {
        let curve = compute(&[0.5, 0.5, 0.5, 0.1], &[1, 0, 1, 0]).unwrap();
        let at_05: Vec<&CurvePoint> = curve.iter().filter(|p| p.threshold == 0.5).collect();
        assert_eq!(at_05.len(), 1);
        assert_eq!(at_05[0].fpr, 0.5);
        assert_eq!(at_05[0].fnr, 0.0);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(matches!(compute(&[], &[]), Err(EvalError::InvalidInput(_))));
        assert!(matches!(compute(&[0.1], &[1, 0]), Err(EvalError::InvalidInput(_))));
        assert!(matches!(compute(&[0.1, 0.2], &[1, 2]), Err(EvalError::InvalidInput(_))));
        assert!(matches!(
            compute(&[f64::NAN, 0.2], &[1, 0]),
            Err(EvalError::InvalidInput(_))
        ));
    }

    #[test]
    fn single_class_input_is_degenerate() {
        let err = compute(&[0.1, 0.2], &[1, 1]).unwrap_err();
        assert_eq!(
            err,
            EvalError::DegenerateLabels {
                genuine: 2,
                impostor: 0
            }
        );
    }

    fn arb_trials() -> impl Strategy<Value = (Vec<f64>, Vec<u8>)> {
        proptest::collection::vec((0u8..20, 0u8..=1), 2..80).prop_filter_map(
            "need both classes",
            |pairs| {
                let scores: Vec<f64> = pairs.iter().map(|(s, _)| *s as f64 / 20.0).collect();
                let labels: Vec<u8> = pairs.iter().map(|(_, l)| *l).collect();
                let pos = labels.iter().filter(|&&l| l == 1).count();
                (pos > 0 && pos < labels.len()).then_some((scores, labels))
            },
        )
    }

    proptest! {
        #[test]
        fn curve_is_monotone_in_threshold((scores, labels) in arb_trials()) {
            let curve = compute(&scores, &labels).unwrap();
            prop_assert!(!curve.is_empty());
            for w in curve.points().windows(2) {
                prop_assert!(w[0].threshold < w[1].threshold);
                prop_assert!(w[0].fpr >= w[1].fpr);
                prop_assert!(w[0].fnr <= w[1].fnr);
            }
            for p in curve.iter() {
                prop_assert!((0.0..=1.0).contains(&p.fpr));
                prop_assert!((0.0..=1.0).contains(&p.fnr));
            }
        }
    }
}
