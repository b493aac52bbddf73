//! Audit entries - one per mutating operation, never altered or removed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};

/// The closed set of auditable actions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    RecordCreated,
    RecordCancelled,
    PaymentConfirmed,
    ContestationSubmitted,
    ContestationAccepted,
    ContestationRejected,
    ImpoundOpened,
    ImpoundReleased,
}

/// A committed entry in the audit chain.
///
/// `hash` covers every other field, including `prev_hash`; see
/// [`crate::hash::calculate_entry_hash`]. The timestamp is assigned by
/// the chain at hash-computation time, not by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub action: AuditAction,
    /// None for system-initiated actions
    pub actor_id: Option<String>,
    /// Id of the record/case the action targets
    pub target_id: String,
    /// Structured action detail; serialized with sorted keys when hashed
    pub payload: Value,
    /// Caller-supplied client metadata (source address, device, ...)
    pub client_info: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Hash of the previous entry; empty string for the first entry
    pub prev_hash: String,
    pub hash: String,
}

/// What a caller submits; sequence, timestamp and hashes are assigned
/// by [`crate::chain::AuditChain::append`].
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub action: AuditAction,
    pub actor_id: Option<String>,
    pub target_id: String,
    pub payload: Value,
    pub client_info: Option<String>,
}

impl EntryDraft {
    pub fn new(action: AuditAction, target_id: impl Into<String>) -> Self {
        Self {
            action,
            actor_id: None,
            target_id: target_id.into(),
            payload: Value::Null,
            client_info: None,
        }
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn client_info(mut self, info: impl Into<String>) -> Self {
        self.client_info = Some(info.into());
        self
    }
}
