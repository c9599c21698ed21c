//! Inverse standard normal CDF (probit / `ppf`).
//!
//! Error rates are often compared on a normal-deviate scale (the DET plot
//! axes), where small differences near 0 or 1 become visible.
//!
//! Limits: `probit(0) = -inf`, `probit(1) = +inf`, NaN outside `[0, 1]`.

use std::sync::OnceLock;

use statrs::distribution::{ContinuousCDF, Normal};

fn standard_normal() -> Option<&'static Normal> {
    static NORMAL: OnceLock<Option<Normal>> = OnceLock::new();
    NORMAL.get_or_init(|| Normal::new(0.0, 1.0).ok()).as_ref()
}

/// Inverse CDF of the standard normal distribution.
pub fn probit(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    match standard_normal() {
        Some(normal) => normal.inverse_cdf(p),
        None => f64::NAN,
    }
}
