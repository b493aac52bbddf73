//! External collaborator seams: offender directory and notifications
//!
//! Both are consumed, never owned. Directory lookups are read-only and
//! happen once, at creation. Notification dispatch is fire-and-forget:
//! a delivery failure is logged and must never roll back a transition.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Read-only lookup into the vehicle/owner directory
pub trait OffenderDirectory: Send + Sync {
    fn vehicle_exists(&self, plate: &str) -> bool;
    fn person_exists(&self, person_id: &str) -> bool;
}

/// Directory backed by fixed sets; `permissive()` resolves everything.
pub struct StaticDirectory {
    vehicles: HashSet<String>,
    persons: HashSet<String>,
    permissive: bool,
}

impl StaticDirectory {
    pub fn new(
        vehicles: impl IntoIterator<Item = String>,
        persons: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            vehicles: vehicles.into_iter().collect(),
            persons: persons.into_iter().collect(),
            permissive: false,
        }
    }

    /// Resolves every reference. For tests and demos.
    pub fn permissive() -> Self {
        Self {
            vehicles: HashSet::new(),
            persons: HashSet::new(),
            permissive: true,
        }
    }
}

impl OffenderDirectory for StaticDirectory {
    fn vehicle_exists(&self, plate: &str) -> bool {
        self.permissive || self.vehicles.contains(plate)
    }

    fn person_exists(&self, person_id: &str) -> bool {
        self.permissive || self.persons.contains(person_id)
    }
}

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RecordCreated,
    PaymentConfirmed,
    RecordCancelled,
    ContestationDecided,
}

/// Outbound notification payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub record_id: String,
    pub message: String,
}

/// Fire-and-forget notification dispatch
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), String>;
}

/// Discards everything. Default when no dispatcher is wired.
#[derive(Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_directory_lookups() {
        let dir = StaticDirectory::new(
            ["B-1234-XYZ".to_string()],
            ["NIK-42".to_string()],
        );
        assert!(dir.vehicle_exists("B-1234-XYZ"));
        assert!(!dir.vehicle_exists("D-0000-A"));
        assert!(dir.person_exists("NIK-42"));
        assert!(!dir.person_exists("NIK-1"));
    }

    #[test]
    fn test_permissive_directory() {
        let dir = StaticDirectory::permissive();
        assert!(dir.vehicle_exists("anything"));
        assert!(dir.person_exists("anyone"));
    }
}
