//! Impound errors

use crate::case::ImpoundStatus;
use fineflow_lifecycle::LifecycleError;
use thiserror::Error;

/// Why a release is blocked right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseBlock {
    MinimumHoldNotMet,
    RecordNotPaid,
    FeeNotConfirmed,
}

impl std::fmt::Display for ReleaseBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseBlock::MinimumHoldNotMet => write!(f, "minimum hold not met"),
            ReleaseBlock::RecordNotPaid => write!(f, "contravention is not paid"),
            ReleaseBlock::FeeNotConfirmed => write!(f, "impound fee payment not confirmed"),
        }
    }
}

/// Errors from the impound manager
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImpoundError {
    #[error("Impound case not found: {0}")]
    NotFound(String),

    #[error("An impound case already exists for record {0}")]
    CaseAlreadyExists(String),

    #[error("Cannot open an impound case for a cancelled record: {0}")]
    RecordCancelled(String),

    #[error("Case is not eligible for release: {0}")]
    NotEligible(ReleaseBlock),

    #[error("Case is not held (status {0})")]
    NotHeld(ImpoundStatus),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for impound operations
pub type ImpoundResult<T> = Result<T, ImpoundError>;
