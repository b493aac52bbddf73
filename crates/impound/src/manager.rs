//! Impound case manager
//!
//! Opens a case at intake, accrues fees, and gates release behind the
//! three statutory conditions: the minimum hold has elapsed, the
//! underlying contravention is paid, and the impound fee is settled.
//! Eligibility checks report the first unmet condition in that order.

use crate::case::{ImpoundCase, ImpoundStatus, ImpoundStore};
use crate::error::{ImpoundError, ImpoundResult, ReleaseBlock};
use chrono::{DateTime, Utc};
use fineflow_audit::{AuditAction, AuditChain, EntryDraft};
use fineflow_calc::calculator;
use fineflow_core::{Actor, Amount, Clock, SystemConfig};
use fineflow_lifecycle::{LifecycleError, RecordStatus, RecordStore};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Outcome of a release-eligibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseDecision {
    pub eligible: bool,
    /// First unmet condition when not eligible
    pub block: Option<ReleaseBlock>,
}

impl ReleaseDecision {
    fn eligible() -> Self {
        Self {
            eligible: true,
            block: None,
        }
    }

    fn blocked(block: ReleaseBlock) -> Self {
        Self {
            eligible: false,
            block: Some(block),
        }
    }
}

/// Manages the vehicle-impound side channel of a contravention.
///
/// Reads records, never mutates them; payment and cancellation stay
/// with the lifecycle engine.
pub struct ImpoundCaseManager {
    store: Arc<dyn ImpoundStore>,
    records: Arc<dyn RecordStore>,
    chain: Arc<AuditChain>,
    clock: Arc<dyn Clock>,
    transport_fee: Amount,
    daily_fee: Amount,
    minimum_hold_days: i64,
}

impl ImpoundCaseManager {
    pub fn new(
        config: &SystemConfig,
        store: Arc<dyn ImpoundStore>,
        records: Arc<dyn RecordStore>,
        chain: Arc<AuditChain>,
        clock: Arc<dyn Clock>,
    ) -> ImpoundResult<Self> {
        let transport_fee = Amount::new(config.impound_transport_fee)
            .map_err(|e| ImpoundError::Validation(format!("impound transport fee: {e}")))?;
        let daily_fee = Amount::new(config.impound_daily_fee)
            .map_err(|e| ImpoundError::Validation(format!("impound daily fee: {e}")))?;

        Ok(Self {
            store,
            records,
            chain,
            clock,
            transport_fee,
            daily_fee,
            minimum_hold_days: config.impound_minimum_hold_days,
        })
    }

    /// Open an impound case for a contravention.
    ///
    /// Refused for cancelled records and when any case already exists
    /// for the record, released or not: a case is 1:1 with its
    /// contravention. A second custody episode means a new
    /// contravention.
    pub fn open(
        &self,
        record_id: &str,
        location: impl Into<String>,
        actor: &Actor,
        client_info: Option<String>,
    ) -> ImpoundResult<ImpoundCase> {
        let record = self.records.get(record_id)?;
        if record.status == RecordStatus::Cancelled {
            return Err(ImpoundError::RecordCancelled(record_id.to_string()));
        }
        if self.store.find_by_record(record_id)?.is_some() {
            return Err(ImpoundError::CaseAlreadyExists(record_id.to_string()));
        }

        let case = ImpoundCase {
            id: format!("IMP-{}", Uuid::new_v4().simple()),
            record_id: record_id.to_string(),
            intake_time: self.clock.now(),
            location: location.into(),
            transport_fee: self.transport_fee,
            daily_fee: self.daily_fee,
            minimum_hold_days: self.minimum_hold_days,
            status: ImpoundStatus::Held,
            released_at: None,
        };

        let mut draft = EntryDraft::new(AuditAction::ImpoundOpened, &case.id)
            .actor(&actor.id)
            .payload(json!({
                "record_id": case.record_id,
                "location": case.location,
                "transport_fee": case.transport_fee,
                "daily_fee": case.daily_fee,
                "minimum_hold_days": case.minimum_hold_days,
            }));
        if let Some(info) = client_info {
            draft = draft.client_info(info);
        }

        self.store.insert(case.clone())?;
        if let Err(e) = self.chain.append(draft).map_err(LifecycleError::from) {
            // Unwind the insert so no case exists without its entry
            if let Err(remove_err) = self.store.remove(&case.id) {
                error!(case_id = %case.id, error = %remove_err, "rollback after failed audit append did not apply");
            }
            return Err(e.into());
        }
        info!(case_id = %case.id, record_id, "impound case opened");
        Ok(case)
    }

    /// Fees accrued so far: flat transport fee plus the daily fee for
    /// every whole day in custody. Accrual continues past the minimum
    /// hold until release.
    pub fn accrued_fee(&self, case_id: &str) -> ImpoundResult<Amount> {
        let case = self.store.get(case_id)?;
        let days = case.days_held(self.clock.now());
        calculator::impound_fee(case.transport_fee, case.daily_fee, days)
            .map_err(|e| ImpoundError::Validation(e.to_string()))
    }

    /// Check the release conditions without changing anything.
    pub fn eligible_for_release(
        &self,
        case_id: &str,
        fee_paid_confirmed: bool,
    ) -> ImpoundResult<ReleaseDecision> {
        let case = self.store.get(case_id)?;
        let record = self.records.get(&case.record_id)?;
        Ok(self.check_release(&case, &record.status, fee_paid_confirmed, self.clock.now()))
    }

    /// Release a held vehicle.
    ///
    /// All three conditions must hold; the first unmet one is reported.
    pub fn release(
        &self,
        case_id: &str,
        fee_paid_confirmed: bool,
        actor: &Actor,
        client_info: Option<String>,
    ) -> ImpoundResult<ImpoundCase> {
        let mut case = self.store.get(case_id)?;
        if case.status != ImpoundStatus::Held {
            return Err(ImpoundError::NotHeld(case.status));
        }

        let now = self.clock.now();
        let record = self.records.get(&case.record_id)?;
        let decision = self.check_release(&case, &record.status, fee_paid_confirmed, now);
        if let Some(block) = decision.block {
            return Err(ImpoundError::NotEligible(block));
        }

        let prior = case.clone();
        case.status = ImpoundStatus::Released;
        case.released_at = Some(now);
        let days_held = case.days_held(now);
        let accrued = calculator::impound_fee(case.transport_fee, case.daily_fee, days_held)
            .map_err(|e| ImpoundError::Validation(e.to_string()))?;

        let mut draft = EntryDraft::new(AuditAction::ImpoundReleased, &case.id)
            .actor(&actor.id)
            .payload(json!({
                "record_id": case.record_id,
                "days_held": days_held,
                "accrued_fee": accrued,
            }));
        if let Some(info) = client_info {
            draft = draft.client_info(info);
        }

        let updated = self.store.update(case)?;
        if let Err(e) = self.chain.append(draft).map_err(LifecycleError::from) {
            // Put the case back to Held so the release does not
            // survive without its entry
            if let Err(restore_err) = self.store.update(prior) {
                error!(case_id = %updated.id, error = %restore_err, "rollback after failed audit append did not apply");
            }
            return Err(e.into());
        }
        info!(case_id = %updated.id, days_held, "impound case released");
        Ok(updated)
    }

    /// Whether the record currently has a vehicle in custody. The
    /// cancellation policy restricts cancellation of such records to
    /// supervisors.
    pub fn held_for_record(&self, record_id: &str) -> ImpoundResult<bool> {
        Ok(self.store.held_for_record(record_id)?.is_some())
    }

    pub fn case(&self, case_id: &str) -> ImpoundResult<ImpoundCase> {
        self.store.get(case_id)
    }

    fn check_release(
        &self,
        case: &ImpoundCase,
        record_status: &RecordStatus,
        fee_paid_confirmed: bool,
        now: DateTime<Utc>,
    ) -> ReleaseDecision {
        if case.days_held(now) < case.minimum_hold_days {
            return ReleaseDecision::blocked(ReleaseBlock::MinimumHoldNotMet);
        }
        if *record_status != RecordStatus::Paid {
            return ReleaseDecision::blocked(ReleaseBlock::RecordNotPaid);
        }
        if !fee_paid_confirmed {
            return ReleaseDecision::blocked(ReleaseBlock::FeeNotConfirmed);
        }
        ReleaseDecision::eligible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::InMemoryImpoundStore;
    use chrono::{Duration, TimeZone};
    use fineflow_core::FixedClock;
    use fineflow_lifecycle::{ContraventionRecord, InMemoryRecordStore, OffenderRef};
    use rust_decimal_macros::dec;

    fn record(id: &str, status: RecordStatus, t: DateTime<Utc>) -> ContraventionRecord {
        ContraventionRecord {
            id: id.to_string(),
            number: format!("NUM-{id}"),
            agent_id: "AGT-1".to_string(),
            violation_type_id: "VT-NO-LICENSE".to_string(),
            offender: OffenderRef::vehicle("B-1234-XYZ"),
            offense_time: t,
            location: "checkpoint 4".to_string(),
            amount_due: Amount::new(dec!(250_000)).unwrap(),
            accident: false,
            recidive: false,
            notes: None,
            status,
            payment_deadline: t + Duration::days(14),
            paid_at: None,
            created_at: t,
            create_entry_hash: String::new(),
            version: 0,
        }
    }

    struct Fixture {
        clock: Arc<FixedClock>,
        records: Arc<InMemoryRecordStore>,
        chain: Arc<AuditChain>,
        manager: ImpoundCaseManager,
    }

    fn fixture() -> Fixture {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(t));
        let chain = Arc::new(AuditChain::new(clock.clone() as Arc<dyn Clock>));
        fixture_with(clock, chain)
    }

    fn fixture_with(clock: Arc<FixedClock>, chain: Arc<AuditChain>) -> Fixture {
        let records = Arc::new(InMemoryRecordStore::new());
        let manager = ImpoundCaseManager::new(
            &SystemConfig::default(),
            Arc::new(InMemoryImpoundStore::new()),
            records.clone() as Arc<dyn RecordStore>,
            chain.clone(),
            clock.clone() as Arc<dyn Clock>,
        )
        .unwrap();
        Fixture {
            clock,
            records,
            chain,
            manager,
        }
    }

    fn pay(records: &InMemoryRecordStore, id: &str) {
        let mut r = records.get(id).unwrap();
        r.transition(RecordStatus::Paid).unwrap();
        records.update(r).unwrap();
    }

    #[test]
    fn test_open_creates_held_case_and_audit_entry() {
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();

        let agent = Actor::agent("AGT-1", "J. Doe");
        let case = fx
            .manager
            .open("CTV-1", "Pound A", &agent, Some("unit-07".to_string()))
            .unwrap();

        assert_eq!(case.status, ImpoundStatus::Held);
        assert_eq!(case.transport_fee, Amount::new(dec!(20_000)).unwrap());
        assert_eq!(case.minimum_hold_days, 10);

        let entries = fx.chain.entries_for_target(&case.id);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::ImpoundOpened);
        assert_eq!(entries[0].payload["record_id"], "CTV-1");
    }

    #[test]
    fn test_open_rejects_cancelled_record() {
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Cancelled, fx.clock.now()))
            .unwrap();

        let result = fx
            .manager
            .open("CTV-1", "Pound A", &Actor::agent("AGT-1", "J. Doe"), None);
        assert!(matches!(result, Err(ImpoundError::RecordCancelled(_))));
    }

    #[test]
    fn test_open_rejects_second_case_while_held() {
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();

        let agent = Actor::agent("AGT-1", "J. Doe");
        fx.manager.open("CTV-1", "Pound A", &agent, None).unwrap();
        let result = fx.manager.open("CTV-1", "Pound B", &agent, None);
        assert!(matches!(result, Err(ImpoundError::CaseAlreadyExists(_))));
    }

    #[test]
    fn test_open_after_release_still_rejected() {
        // A case is 1:1 with its record for good, not just while Held
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();
        let agent = Actor::agent("AGT-1", "J. Doe");
        let case = fx.manager.open("CTV-1", "Pound A", &agent, None).unwrap();

        pay(&fx.records, "CTV-1");
        fx.clock.advance(Duration::days(12));
        fx.manager.release(&case.id, true, &agent, None).unwrap();

        let result = fx.manager.open("CTV-1", "Pound B", &agent, None);
        assert!(matches!(result, Err(ImpoundError::CaseAlreadyExists(_))));
    }

    struct FlakySink {
        ok_appends: usize,
    }

    impl std::io::Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if self.ok_appends == 0 {
                Err(std::io::Error::other("sink unavailable"))
            } else {
                self.ok_appends -= 1;
                Ok(())
            }
        }
    }

    fn fixture_with_flaky_sink(ok_appends: usize) -> Fixture {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(t));
        let chain = Arc::new(AuditChain::with_writer(
            Box::new(FlakySink { ok_appends }),
            clock.clone() as Arc<dyn Clock>,
        ));
        fixture_with(clock, chain)
    }

    #[test]
    fn test_open_unwinds_store_when_append_fails() {
        let fx = fixture_with_flaky_sink(0);
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();
        let agent = Actor::agent("AGT-1", "J. Doe");

        let first = fx.manager.open("CTV-1", "Pound A", &agent, None);
        assert!(matches!(first, Err(ImpoundError::Lifecycle(_))));
        assert!(!fx.manager.held_for_record("CTV-1").unwrap());
        assert!(fx.chain.is_empty());

        // The failed open left no case behind, so a retry reaches the
        // sink again instead of tripping the duplicate-case guard
        let second = fx.manager.open("CTV-1", "Pound A", &agent, None);
        assert!(matches!(second, Err(ImpoundError::Lifecycle(_))));
    }

    #[test]
    fn test_release_rolls_back_when_append_fails() {
        let fx = fixture_with_flaky_sink(1);
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();
        let agent = Actor::agent("AGT-1", "J. Doe");
        let case = fx.manager.open("CTV-1", "Pound A", &agent, None).unwrap();

        pay(&fx.records, "CTV-1");
        fx.clock.advance(Duration::days(12));

        let result = fx.manager.release(&case.id, true, &agent, None);
        assert!(matches!(result, Err(ImpoundError::Lifecycle(_))));

        let reloaded = fx.manager.case(&case.id).unwrap();
        assert_eq!(reloaded.status, ImpoundStatus::Held);
        assert!(reloaded.released_at.is_none());
        assert_eq!(fx.chain.len(), 1);
    }

    #[test]
    fn test_release_blocked_before_minimum_hold() {
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();
        let agent = Actor::agent("AGT-1", "J. Doe");
        let case = fx.manager.open("CTV-1", "Pound A", &agent, None).unwrap();

        pay(&fx.records, "CTV-1");
        fx.clock.advance(Duration::days(5));

        let decision = fx.manager.eligible_for_release(&case.id, true).unwrap();
        assert!(!decision.eligible);
        assert_eq!(decision.block, Some(ReleaseBlock::MinimumHoldNotMet));

        let result = fx.manager.release(&case.id, true, &agent, None);
        assert!(matches!(
            result,
            Err(ImpoundError::NotEligible(ReleaseBlock::MinimumHoldNotMet))
        ));
    }

    #[test]
    fn test_release_blocked_while_record_unpaid() {
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();
        let agent = Actor::agent("AGT-1", "J. Doe");
        let case = fx.manager.open("CTV-1", "Pound A", &agent, None).unwrap();

        fx.clock.advance(Duration::days(12));

        let decision = fx.manager.eligible_for_release(&case.id, true).unwrap();
        assert_eq!(decision.block, Some(ReleaseBlock::RecordNotPaid));
    }

    #[test]
    fn test_release_blocked_until_fee_confirmed() {
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();
        let agent = Actor::agent("AGT-1", "J. Doe");
        let case = fx.manager.open("CTV-1", "Pound A", &agent, None).unwrap();

        pay(&fx.records, "CTV-1");
        fx.clock.advance(Duration::days(12));

        let decision = fx.manager.eligible_for_release(&case.id, false).unwrap();
        assert_eq!(decision.block, Some(ReleaseBlock::FeeNotConfirmed));
    }

    #[test]
    fn test_release_after_twelve_days() {
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();
        let agent = Actor::agent("AGT-1", "J. Doe");
        let case = fx.manager.open("CTV-1", "Pound A", &agent, None).unwrap();

        pay(&fx.records, "CTV-1");
        fx.clock.advance(Duration::days(12));

        // 20_000 transport + 10_000/day * 12 days
        assert_eq!(
            fx.manager.accrued_fee(&case.id).unwrap(),
            Amount::new(dec!(140_000)).unwrap()
        );

        let released = fx.manager.release(&case.id, true, &agent, None).unwrap();
        assert_eq!(released.status, ImpoundStatus::Released);
        assert_eq!(released.released_at, Some(fx.clock.now()));

        let entries = fx.chain.entries_for_target(&case.id);
        assert_eq!(entries.last().unwrap().action, AuditAction::ImpoundReleased);
        assert_eq!(entries.last().unwrap().payload["days_held"], 12);
        assert_eq!(entries.last().unwrap().payload["accrued_fee"], "140000");
    }

    #[test]
    fn test_release_exactly_at_minimum_hold() {
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();
        let agent = Actor::agent("AGT-1", "J. Doe");
        let case = fx.manager.open("CTV-1", "Pound A", &agent, None).unwrap();

        pay(&fx.records, "CTV-1");
        fx.clock.advance(Duration::days(10));

        let decision = fx.manager.eligible_for_release(&case.id, true).unwrap();
        assert!(decision.eligible);
    }

    #[test]
    fn test_release_twice_rejected() {
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();
        let agent = Actor::agent("AGT-1", "J. Doe");
        let case = fx.manager.open("CTV-1", "Pound A", &agent, None).unwrap();

        pay(&fx.records, "CTV-1");
        fx.clock.advance(Duration::days(12));
        fx.manager.release(&case.id, true, &agent, None).unwrap();

        let result = fx.manager.release(&case.id, true, &agent, None);
        assert!(matches!(
            result,
            Err(ImpoundError::NotHeld(ImpoundStatus::Released))
        ));
    }

    #[test]
    fn test_held_for_record_tracks_custody() {
        let fx = fixture();
        fx.records
            .insert(record("CTV-1", RecordStatus::Unpaid, fx.clock.now()))
            .unwrap();
        let agent = Actor::agent("AGT-1", "J. Doe");

        assert!(!fx.manager.held_for_record("CTV-1").unwrap());
        let case = fx.manager.open("CTV-1", "Pound A", &agent, None).unwrap();
        assert!(fx.manager.held_for_record("CTV-1").unwrap());

        pay(&fx.records, "CTV-1");
        fx.clock.advance(Duration::days(12));
        fx.manager.release(&case.id, true, &agent, None).unwrap();
        assert!(!fx.manager.held_for_record("CTV-1").unwrap());
    }

    #[test]
    fn test_open_for_missing_record() {
        let fx = fixture();
        let result = fx
            .manager
            .open("CTV-X", "Pound A", &Actor::agent("AGT-1", "J. Doe"), None);
        assert!(matches!(
            result,
            Err(ImpoundError::Lifecycle(LifecycleError::NotFound(_)))
        ));
    }
}
