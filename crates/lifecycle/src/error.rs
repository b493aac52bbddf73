//! Lifecycle errors
//!
//! Validation and permission errors propagate to the caller for user
//! feedback. Storage internals are scrubbed into `Internal`.
//! `ChainIntegrity` stays its own variant: it is fatal and operators
//! alert on it specifically.

use crate::authz::DenialReason;
use crate::record::RecordStatus;
use fineflow_audit::AuditError;
use fineflow_calc::CalcError;
use fineflow_catalog::CatalogError;
use fineflow_core::Amount;
use thiserror::Error;

/// Errors from lifecycle operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidState { from: RecordStatus, to: RecordStatus },

    #[error("Permission denied: {0}")]
    PermissionDenied(DenialReason),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Contravention not found: {0}")]
    NotFound(String),

    #[error("Confirmed amount {actual} does not match amount due {expected}")]
    AmountMismatch { expected: Amount, actual: Amount },

    #[error("Concurrent update conflict on {0}")]
    ConcurrencyConflict(String),

    #[error("Audit chain integrity failure: {0}")]
    ChainIntegrity(AuditError),

    #[error("Calculation error: {0}")]
    Calc(#[from] CalcError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuditError> for LifecycleError {
    fn from(e: AuditError) -> Self {
        match e {
            AuditError::ChainIntegrity { .. } => LifecycleError::ChainIntegrity(e),
            other => LifecycleError::Internal(other.to_string()),
        }
    }
}

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
