//! Contravention records and the status transition matrix

use crate::error::{LifecycleError, LifecycleResult};
use chrono::{DateTime, Utc};
use fineflow_core::Amount;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Record status - a closed set with a fixed transition matrix.
///
/// `Unpaid` is the initial state. `Paid` is terminal except for an
/// authorized cancellation, which voids the recorded payment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordStatus {
    Unpaid,
    Paid,
    Contested,
    Cancelled,
}

impl RecordStatus {
    /// The complete transition matrix. Everything not listed here is
    /// unreachable, whatever the caller.
    pub fn can_transition(self, to: RecordStatus) -> bool {
        use RecordStatus::*;
        matches!(
            (self, to),
            (Unpaid, Paid)
                | (Unpaid, Contested)
                | (Unpaid, Cancelled)
                | (Contested, Unpaid)
                | (Contested, Cancelled)
                | (Paid, Cancelled)
        )
    }

    pub fn is_final(self) -> bool {
        matches!(self, RecordStatus::Cancelled)
    }
}

/// Who the contravention is recorded against.
///
/// At least one of the two references must be present; creation
/// validates that one of them resolves in the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffenderRef {
    pub vehicle_plate: Option<String>,
    pub person_id: Option<String>,
}

impl OffenderRef {
    pub fn vehicle(plate: impl Into<String>) -> Self {
        Self {
            vehicle_plate: Some(plate.into()),
            person_id: None,
        }
    }

    pub fn person(id: impl Into<String>) -> Self {
        Self {
            vehicle_plate: None,
            person_id: Some(id.into()),
        }
    }

    pub fn both(plate: impl Into<String>, person: impl Into<String>) -> Self {
        Self {
            vehicle_plate: Some(plate.into()),
            person_id: Some(person.into()),
        }
    }

    pub fn has_reference(&self) -> bool {
        self.vehicle_plate.is_some() || self.person_id.is_some()
    }

    /// Two refs identify the same offender when they share a vehicle
    /// plate or a person id. Used by recidive detection.
    pub fn same_offender(&self, other: &OffenderRef) -> bool {
        let same_vehicle = match (&self.vehicle_plate, &other.vehicle_plate) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        let same_person = match (&self.person_id, &other.person_id) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        same_vehicle || same_person
    }
}

/// A recorded traffic-code violation with its fine.
///
/// Owned exclusively by the lifecycle engine for mutation; `version`
/// backs the store's optimistic concurrency check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContraventionRecord {
    pub id: String,
    /// Human-readable reference number printed on the ticket
    pub number: String,
    pub agent_id: String,
    pub violation_type_id: String,
    pub offender: OffenderRef,
    pub offense_time: DateTime<Utc>,
    pub location: String,
    pub amount_due: Amount,
    pub accident: bool,
    pub recidive: bool,
    pub notes: Option<String>,
    pub status: RecordStatus,
    pub payment_deadline: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Hash of this record's creation entry in the audit chain
    pub create_entry_hash: String,
    pub version: u64,
}

impl ContraventionRecord {
    /// Move to a new status, enforcing the transition matrix.
    pub fn transition(&mut self, to: RecordStatus) -> LifecycleResult<()> {
        if !self.status.can_transition(to) {
            return Err(LifecycleError::InvalidState {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Pure read used by external schedulers; never mutates status.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == RecordStatus::Unpaid && now > self.payment_deadline
    }

    /// Whole days past the deadline; zero or negative when not overdue.
    /// A record less than a full day late owes no penalty yet.
    pub fn days_overdue(&self, now: DateTime<Utc>) -> i64 {
        (now - self.payment_deadline).num_days()
    }
}
