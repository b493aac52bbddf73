//! Fineflow Audit - append-only, hash-linked action ledger
//!
//! Every state-changing operation in the system appends exactly one
//! entry here. Each entry's hash covers the previous entry's hash, so
//! any after-the-fact edit breaks verification at or after the edited
//! entry.
//!
//! The chain is strictly linear: appends are serialized behind one
//! write lock, and the tail is read and extended under that same lock.
//! Two concurrent appends can never observe the same tail, so the
//! chain cannot fork.

pub mod chain;
pub mod entry;
pub mod error;
pub mod hash;

pub use chain::AuditChain;
pub use entry::{AuditAction, AuditEntry, EntryDraft};
pub use error::{AuditError, IntegrityFault};
