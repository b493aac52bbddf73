//! Service-level error - the union of every component's errors

use fineflow_audit::AuditError;
use fineflow_contest::ContestError;
use fineflow_impound::ImpoundError;
use fineflow_lifecycle::LifecycleError;
use thiserror::Error;

/// Anything a service operation can fail with.
///
/// Catalog and calculation errors arrive already wrapped in
/// [`LifecycleError`]; only the four component roots appear here.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Contest(#[from] ContestError),

    #[error(transparent)]
    Impound(#[from] ImpoundError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
