//! Recidive detection - trailing-window repeat-offense query
//!
//! Policy decision: only records currently in {Unpaid, Paid} count.
//! A record under contestation is excluded while Contested; if the
//! contestation is rejected it returns to Unpaid and counts again.
//! Cancelled records never count.

use crate::error::LifecycleResult;
use crate::record::{OffenderRef, RecordStatus};
use crate::store::RecordStore;
use chrono::{DateTime, Months, Utc};
use std::sync::Arc;

/// Windowed historical query over past records for one offender and
/// violation type.
pub struct RecidiveDetector {
    store: Arc<dyn RecordStore>,
    window: Months,
}

impl RecidiveDetector {
    pub fn new(store: Arc<dyn RecordStore>, window: Months) -> Self {
        Self { store, window }
    }

    /// True iff another record for the same offender and violation type
    /// has its offense date inside `[now - window, now]` and a status
    /// in {Unpaid, Paid}.
    pub fn has_recidive(
        &self,
        offender: &OffenderRef,
        violation_type_id: &str,
        now: DateTime<Utc>,
    ) -> LifecycleResult<bool> {
        let cutoff = now
            .checked_sub_months(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let past = self.store.find_by_offender(offender, violation_type_id)?;
        Ok(past.iter().any(|r| {
            matches!(r.status, RecordStatus::Unpaid | RecordStatus::Paid)
                && r.offense_time >= cutoff
                && r.offense_time <= now
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ContraventionRecord;
    use crate::store::InMemoryRecordStore;
    use chrono::{Duration, TimeZone};
    use fineflow_core::Amount;
    use rust_decimal_macros::dec;

    fn record(id: &str, status: RecordStatus, offense_time: DateTime<Utc>) -> ContraventionRecord {
        ContraventionRecord {
            id: id.to_string(),
            number: format!("NUM-{id}"),
            agent_id: "AGT-1".to_string(),
            violation_type_id: "VT-RED-LIGHT".to_string(),
            offender: OffenderRef::vehicle("B-1234-XYZ"),
            offense_time,
            location: "Main St".to_string(),
            amount_due: Amount::new(dec!(100_000)).unwrap(),
            accident: false,
            recidive: false,
            notes: None,
            status,
            payment_deadline: offense_time + Duration::days(14),
            paid_at: None,
            created_at: offense_time,
            create_entry_hash: String::new(),
            version: 0,
        }
    }

    fn detector(store: Arc<InMemoryRecordStore>) -> RecidiveDetector {
        RecidiveDetector::new(store, Months::new(12))
    }

    #[test]
    fn test_recent_paid_record_counts() {
        let store = Arc::new(InMemoryRecordStore::new());
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        store
            .insert(record("CTV-1", RecordStatus::Paid, now - Duration::days(60)))
            .unwrap();

        let detector = detector(Arc::clone(&store));
        assert!(detector
            .has_recidive(&OffenderRef::vehicle("B-1234-XYZ"), "VT-RED-LIGHT", now)
            .unwrap());
    }

    #[test]
    fn test_record_outside_window_ignored() {
        let store = Arc::new(InMemoryRecordStore::new());
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        store
            .insert(record(
                "CTV-1",
                RecordStatus::Paid,
                now - Duration::days(400),
            ))
            .unwrap();

        let detector = detector(Arc::clone(&store));
        assert!(!detector
            .has_recidive(&OffenderRef::vehicle("B-1234-XYZ"), "VT-RED-LIGHT", now)
            .unwrap());
    }

    #[test]
    fn test_contested_and_cancelled_do_not_count() {
        let store = Arc::new(InMemoryRecordStore::new());
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        store
            .insert(record(
                "CTV-1",
                RecordStatus::Contested,
                now - Duration::days(30),
            ))
            .unwrap();
        store
            .insert(record(
                "CTV-2",
                RecordStatus::Cancelled,
                now - Duration::days(20),
            ))
            .unwrap();

        let detector = detector(Arc::clone(&store));
        assert!(!detector
            .has_recidive(&OffenderRef::vehicle("B-1234-XYZ"), "VT-RED-LIGHT", now)
            .unwrap());
    }

    #[test]
    fn test_different_type_or_offender_ignored() {
        let store = Arc::new(InMemoryRecordStore::new());
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        store
            .insert(record("CTV-1", RecordStatus::Paid, now - Duration::days(30)))
            .unwrap();

        let detector = detector(Arc::clone(&store));
        assert!(!detector
            .has_recidive(&OffenderRef::vehicle("B-1234-XYZ"), "VT-SPEEDING", now)
            .unwrap());
        assert!(!detector
            .has_recidive(&OffenderRef::vehicle("D-0000-A"), "VT-RED-LIGHT", now)
            .unwrap());
    }

    #[test]
    fn test_future_offense_not_counted() {
        // Clock skew guard: an offense time past "now" is not in the
        // trailing window
        let store = Arc::new(InMemoryRecordStore::new());
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        store
            .insert(record("CTV-1", RecordStatus::Unpaid, now + Duration::days(1)))
            .unwrap();

        let detector = detector(Arc::clone(&store));
        assert!(!detector
            .has_recidive(&OffenderRef::vehicle("B-1234-XYZ"), "VT-RED-LIGHT", now)
            .unwrap());
    }
}
