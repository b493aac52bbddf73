//! Fineflow Lifecycle - the contravention state machine
//!
//! This is the HEART of Fineflow. All record status changes go through
//! this crate; other components request transitions through
//! [`LifecycleEngine`]'s public operations and never write status
//! directly.
//!
//! # Key Types
//! - `ContraventionRecord` / `RecordStatus`: the record and its closed
//!   transition matrix
//! - `LifecycleEngine`: creation, cancellation, payment confirmation
//! - `AuthorizationPolicy`: who may cancel, and when
//! - `RecidiveDetector`: trailing-window repeat-offense query
//! - `RecordStore`: versioned storage seam (in-memory impl provided)

pub mod authz;
pub mod directory;
pub mod engine;
pub mod error;
pub mod recidive;
pub mod record;
pub mod store;

pub use authz::{AuthorizationPolicy, CancelDecision, DenialReason};
pub use directory::{
    Notification, NotificationKind, Notifier, NullNotifier, OffenderDirectory, StaticDirectory,
};
pub use engine::{CreateContravention, LifecycleEngine};
pub use error::{LifecycleError, LifecycleResult};
pub use recidive::RecidiveDetector;
pub use record::{ContraventionRecord, OffenderRef, RecordStatus};
pub use store::{InMemoryRecordStore, RecordStore};
