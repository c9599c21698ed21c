//! Error types.
//!
//! - `EvalError` is what the library computations return.
//! - `AppError` is what the binary reports: a message plus a process exit code
//!   (2 = usage/input, 3 = no usable data, 4 = computation failure).

use thiserror::Error;

/// Errors raised by the evaluation core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Only one class present; FPR or FNR has no denominator.
    #[error("Degenerate labels: {genuine} genuine / {impostor} impostor trials (need at least one of each)")]
    DegenerateLabels { genuine: usize, impostor: usize },

    /// Every candidate in a minimum search was NaN.
    #[error("Numeric degenerate: {0}")]
    NumericDegenerate(String),

    #[error("No threshold comparable to target {target} (empty curve?)")]
    AlignmentMiss { target: f64 },

    #[error("Cost parameters differ between baseline and subgroup results")]
    CostMismatch,

    #[error("Subgroup '{0}' has no rows in the curve table")]
    UnknownSubgroup(String),
}

impl EvalError {
    pub fn invalid(message: impl Into<String>) -> Self {
        EvalError::InvalidInput(message.into())
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<EvalError> for AppError {
    fn from(err: EvalError) -> Self {
        let exit_code = match err {
            EvalError::InvalidInput(_) => 2,
            _ => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_errors_map_to_exit_codes() {
        let usage: AppError = EvalError::invalid("bad").into();
        assert_eq!(usage.exit_code(), 2);

        let compute: AppError = EvalError::AlignmentMiss { target: 0.5 }.into();
        assert_eq!(compute.exit_code(), 4);
        assert!(compute.to_string().contains("0.5"));
    }
}
