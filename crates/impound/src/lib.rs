//! Fineflow Impound - vehicle holding and release
//!
//! An impound case is 1:1 with a contravention that requires impound.
//! Fees accrue from intake until release; the minimum-hold period
//! gates release eligibility only, never accrual.

pub mod case;
pub mod error;
pub mod manager;

pub use case::{ImpoundCase, ImpoundStatus, ImpoundStore, InMemoryImpoundStore};
pub use error::{ImpoundError, ImpoundResult, ReleaseBlock};
pub use manager::{ImpoundCaseManager, ReleaseDecision};
