//! Calculator errors

use fineflow_core::amount::AmountError;
use thiserror::Error;

/// Errors from the financial calculators
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("Amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("Negative rate: {0}")]
    NegativeRate(String),
}

/// Result type for calculator operations
pub type CalcResult<T> = Result<T, CalcError>;
