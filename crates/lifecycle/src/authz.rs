//! Cancellation authorization policy
//!
//! The denial reason is part of the contract: "window exceeded" is
//! distinct from a plain "no grant" so callers can route an agent past
//! the window to supervisor escalation instead of a flat rejection.

use crate::record::ContraventionRecord;
use chrono::{DateTime, Duration, Utc};
use fineflow_core::{Actor, SystemConfig};
use serde::{Deserialize, Serialize};

/// Why a cancellation was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Actor has no grant on this record at all
    NoGrant,
    /// Issuing agent, but the direct-cancellation window has passed
    WindowExceeded,
    /// A held impound case restricts cancellation to supervisors
    ImpoundHeld,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::NoGrant => write!(f, "no cancellation grant for this actor"),
            DenialReason::WindowExceeded => write!(f, "direct cancellation window exceeded"),
            DenialReason::ImpoundHeld => {
                write!(f, "vehicle impound is held; supervisor approval required")
            }
        }
    }
}

/// Outcome of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelDecision {
    pub granted: bool,
    pub denial: Option<DenialReason>,
}

impl CancelDecision {
    fn granted() -> Self {
        Self {
            granted: true,
            denial: None,
        }
    }

    fn denied(reason: DenialReason) -> Self {
        Self {
            granted: false,
            denial: Some(reason),
        }
    }
}

/// Decides who may cancel a record, and when
pub struct AuthorizationPolicy {
    direct_window: Duration,
}

impl AuthorizationPolicy {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            direct_window: config.direct_cancellation_window(),
        }
    }

    /// Grant rules:
    /// - supervisors/administrators: any time;
    /// - the issuing agent: while `now - created_at` is within the
    ///   direct window, inclusive at exactly the boundary;
    /// - nobody else.
    ///
    /// A `Held` impound case restricts cancellation to supervisors
    /// regardless of the window.
    pub fn can_cancel(
        &self,
        record: &ContraventionRecord,
        impound_held: bool,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> CancelDecision {
        if actor.role.is_supervisory() {
            return CancelDecision::granted();
        }

        if impound_held {
            return CancelDecision::denied(DenialReason::ImpoundHeld);
        }

        if actor.id != record.agent_id {
            return CancelDecision::denied(DenialReason::NoGrant);
        }

        if now - record.created_at <= self.direct_window {
            CancelDecision::granted()
        } else {
            CancelDecision::denied(DenialReason::WindowExceeded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{OffenderRef, RecordStatus};
    use fineflow_core::Amount;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn record() -> ContraventionRecord {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        ContraventionRecord {
            id: "CTV-1".to_string(),
            number: "CTV-20260301-0001".to_string(),
            agent_id: "AGT-1".to_string(),
            violation_type_id: "VT-RED-LIGHT".to_string(),
            offender: OffenderRef::vehicle("B-1234-XYZ"),
            offense_time: t,
            location: "Main St".to_string(),
            amount_due: Amount::new(dec!(100_000)).unwrap(),
            accident: false,
            recidive: false,
            notes: None,
            status: RecordStatus::Unpaid,
            payment_deadline: t + Duration::days(14),
            paid_at: None,
            created_at: t,
            create_entry_hash: String::new(),
            version: 0,
        }
    }

    fn policy() -> AuthorizationPolicy {
        AuthorizationPolicy::new(&SystemConfig::default())
    }

    #[test]
    fn test_issuing_agent_within_window() {
        let record = record();
        let agent = Actor::agent("AGT-1", "Issuer");
        let decision = policy().can_cancel(
            &record,
            false,
            &agent,
            record.created_at + Duration::hours(5),
        );
        assert!(decision.granted);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let record = record();
        let agent = Actor::agent("AGT-1", "Issuer");
        let exactly = record.created_at + Duration::hours(24);
        assert!(policy().can_cancel(&record, false, &agent, exactly).granted);

        let just_past = exactly + Duration::seconds(1);
        let decision = policy().can_cancel(&record, false, &agent, just_past);
        assert!(!decision.granted);
        assert_eq!(decision.denial, Some(DenialReason::WindowExceeded));
    }

    #[test]
    fn test_supervisor_any_time() {
        let record = record();
        let supervisor = Actor::supervisor("SUP-1", "Chief");
        let much_later = record.created_at + Duration::days(400);
        assert!(policy().can_cancel(&record, false, &supervisor, much_later).granted);
    }

    #[test]
    fn test_other_agent_denied_no_grant() {
        let record = record();
        let other = Actor::agent("AGT-2", "Someone else");
        let decision =
            policy().can_cancel(&record, false, &other, record.created_at + Duration::hours(1));
        assert!(!decision.granted);
        assert_eq!(decision.denial, Some(DenialReason::NoGrant));
    }

    #[test]
    fn test_held_impound_blocks_agent_even_inside_window() {
        let record = record();
        let agent = Actor::agent("AGT-1", "Issuer");
        let decision =
            policy().can_cancel(&record, true, &agent, record.created_at + Duration::hours(1));
        assert!(!decision.granted);
        assert_eq!(decision.denial, Some(DenialReason::ImpoundHeld));
    }

    #[test]
    fn test_held_impound_does_not_block_supervisor() {
        let record = record();
        let admin = Actor::administrator("ADM-1", "Root");
        let decision =
            policy().can_cancel(&record, true, &admin, record.created_at + Duration::days(30));
        assert!(decision.granted);
    }
}
