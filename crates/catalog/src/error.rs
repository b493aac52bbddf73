//! Catalog errors

use thiserror::Error;

/// Errors from catalog lookups and construction
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Violation type not found: {0}")]
    NotFound(String),

    #[error("Violation type is inactive: {0}")]
    Inactive(String),

    #[error("Duplicate violation type id: {0}")]
    DuplicateId(String),

    #[error("Invalid amount range for {id}: min {min} > max {max}")]
    InvalidRange { id: String, min: String, max: String },
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
