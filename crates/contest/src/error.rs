//! Contestation errors

use fineflow_lifecycle::{LifecycleError, RecordStatus};
use thiserror::Error;

use crate::contestation::ContestationStatus;

/// Errors from the contestation workflow
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContestError {
    #[error("Contestation not found: {0}")]
    NotFound(String),

    #[error("Record cannot be contested in status {0}")]
    RecordNotContestable(RecordStatus),

    #[error("An active contestation already exists for record {0}")]
    ActiveContestationExists(String),

    #[error("Justification too short: {actual} chars, minimum {minimum}")]
    JustificationTooShort { actual: usize, minimum: usize },

    #[error("Contestation review requires supervisor or administrator role")]
    PermissionDenied,

    #[error("Contestation already decided: status {0}")]
    AlreadyDecided(ContestationStatus),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for contestation operations
pub type ContestResult<T> = Result<T, ContestError>;
