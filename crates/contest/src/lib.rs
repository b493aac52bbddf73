//! Fineflow Contest - dispute submission and review
//!
//! A contestation suspends the payment deadline while it is open.
//! Acceptance cancels the record through the lifecycle engine,
//! bypassing the direct-cancellation window (the reviewer's authority
//! is checked here instead); rejection reinstates the record with a
//! fresh deadline counted from the decision time.

pub mod contestation;
pub mod error;
pub mod workflow;

pub use contestation::{
    ContestationRecord, ContestationStatus, ContestationStore, InMemoryContestationStore,
};
pub use error::{ContestError, ContestResult};
pub use workflow::{ContestationWorkflow, SubmitContestation};
