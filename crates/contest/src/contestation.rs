//! Contestation records and their storage seam

use crate::error::{ContestError, ContestResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use strum_macros::{Display, EnumString};

/// Contestation status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContestationStatus {
    Pending,
    UnderReview,
    Accepted,
    Rejected,
}

impl ContestationStatus {
    /// Still awaiting a decision
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ContestationStatus::Pending | ContestationStatus::UnderReview
        )
    }
}

/// A formal dispute filed against a contravention.
///
/// n:1 with a record, but at most one may be active at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestationRecord {
    pub id: String,
    pub record_id: String,
    pub submitted_at: DateTime<Utc>,
    pub claimant_name: String,
    pub claimant_contact: String,
    pub justification: String,
    /// References to supporting documents held by the outer layer
    pub documents: Vec<String>,
    pub status: ContestationStatus,
    pub reviewer_id: Option<String>,
    pub rationale: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Storage for contestations
pub trait ContestationStore: Send + Sync {
    fn insert(&self, contestation: ContestationRecord) -> ContestResult<()>;

    fn get(&self, id: &str) -> ContestResult<ContestationRecord>;

    fn update(&self, contestation: ContestationRecord) -> ContestResult<ContestationRecord>;

    /// Remove a contestation. Only used to unwind a submission whose
    /// audit append failed; never part of normal operation.
    fn remove(&self, id: &str) -> ContestResult<()>;

    /// The Pending/UnderReview contestation for a record, if any
    fn active_for_record(&self, record_id: &str) -> ContestResult<Option<ContestationRecord>>;
}

/// Reference in-memory store
#[derive(Default)]
pub struct InMemoryContestationStore {
    contestations: RwLock<HashMap<String, ContestationRecord>>,
}

impl InMemoryContestationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContestationStore for InMemoryContestationStore {
    fn insert(&self, contestation: ContestationRecord) -> ContestResult<()> {
        let mut map = self.contestations.write().map_err(|_| poisoned())?;
        if map.contains_key(&contestation.id) {
            return Err(ContestError::Validation(format!(
                "contestation already exists: {}",
                contestation.id
            )));
        }
        map.insert(contestation.id.clone(), contestation);
        Ok(())
    }

    fn get(&self, id: &str) -> ContestResult<ContestationRecord> {
        self.contestations
            .read()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned()
            .ok_or_else(|| ContestError::NotFound(id.to_string()))
    }

    fn update(&self, contestation: ContestationRecord) -> ContestResult<ContestationRecord> {
        let mut map = self.contestations.write().map_err(|_| poisoned())?;
        if !map.contains_key(&contestation.id) {
            return Err(ContestError::NotFound(contestation.id));
        }
        map.insert(contestation.id.clone(), contestation.clone());
        Ok(contestation)
    }

    fn remove(&self, id: &str) -> ContestResult<()> {
        let mut map = self.contestations.write().map_err(|_| poisoned())?;
        map.remove(id)
            .map(|_| ())
            .ok_or_else(|| ContestError::NotFound(id.to_string()))
    }

    fn active_for_record(&self, record_id: &str) -> ContestResult<Option<ContestationRecord>> {
        Ok(self
            .contestations
            .read()
            .map_err(|_| poisoned())?
            .values()
            .find(|c| c.record_id == record_id && c.status.is_active())
            .cloned())
    }
}

fn poisoned() -> ContestError {
    ContestError::Internal("contestation store lock poisoned".to_string())
}
