//! Audit chain errors
//!
//! `ChainIntegrity` is deliberately its own variant: it is fatal,
//! requires operator intervention, and callers alert on it
//! specifically. It is never retried.

use thiserror::Error;

/// What exactly failed during chain verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityFault {
    /// `prev_hash` does not match the hash of the preceding entry
    BrokenLink { expected: String, actual: String },
    /// Stored hash does not match the recomputed hash
    InvalidHash { expected: String, actual: String },
    /// Sequence numbers are not contiguous
    SequenceGap { expected: u64, actual: u64 },
}

impl std::fmt::Display for IntegrityFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityFault::BrokenLink { expected, actual } => {
                write!(f, "broken link: expected prev_hash '{expected}', got '{actual}'")
            }
            IntegrityFault::InvalidHash { expected, actual } => {
                write!(f, "invalid hash: expected '{expected}', got '{actual}'")
            }
            IntegrityFault::SequenceGap { expected, actual } => {
                write!(f, "sequence gap: expected {expected}, got {actual}")
            }
        }
    }
}

/// Errors from the audit chain
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Chain integrity failure at sequence {sequence}: {fault}")]
    ChainIntegrity { sequence: u64, fault: IntegrityFault },

    #[error("Audit entry not found: sequence {0}")]
    EntryNotFound(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Audit storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for AuditError {
    fn from(e: serde_json::Error) -> Self {
        AuditError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for AuditError {
    fn from(e: std::io::Error) -> Self {
        AuditError::Storage(e.to_string())
    }
}

/// Result type for audit operations
pub type AuditResult<T> = Result<T, AuditError>;
