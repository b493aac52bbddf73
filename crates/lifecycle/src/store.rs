//! Record storage seam
//!
//! Persistence technology is deliberately unspecified; the engine only
//! needs get/insert/versioned-update and an offender scan for recidive
//! queries. The in-memory implementation is the reference store and
//! what every test runs against.

use crate::error::{LifecycleError, LifecycleResult};
use crate::record::{ContraventionRecord, OffenderRef};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Storage for contravention records.
///
/// `update` is optimistic: it fails with `ConcurrencyConflict` when
/// the stored version no longer matches the caller's copy.
pub trait RecordStore: Send + Sync {
    fn insert(&self, record: ContraventionRecord) -> LifecycleResult<()>;

    fn get(&self, id: &str) -> LifecycleResult<ContraventionRecord>;

    /// Compare-and-swap on `record.version`; bumps the version on
    /// success and returns the stored copy.
    fn update(&self, record: ContraventionRecord) -> LifecycleResult<ContraventionRecord>;

    /// Remove a record. Only used to unwind a creation whose audit
    /// append failed; never part of normal operation.
    fn remove(&self, id: &str) -> LifecycleResult<()>;

    /// All records for the same offender and violation type, any status
    fn find_by_offender(
        &self,
        offender: &OffenderRef,
        violation_type_id: &str,
    ) -> LifecycleResult<Vec<ContraventionRecord>>;
}

/// Reference in-memory store
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, ContraventionRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Reads recover the data from a poisoned lock; a panicked writer
    // either inserted its record or did not, so the map stays valid
    // and must not be misreported as empty.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, record: ContraventionRecord) -> LifecycleResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if records.contains_key(&record.id) {
            return Err(LifecycleError::Validation(format!(
                "record already exists: {}",
                record.id
            )));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    fn get(&self, id: &str) -> LifecycleResult<ContraventionRecord> {
        self.records
            .read()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned()
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))
    }

    fn update(&self, mut record: ContraventionRecord) -> LifecycleResult<ContraventionRecord> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let stored = records
            .get(&record.id)
            .ok_or_else(|| LifecycleError::NotFound(record.id.clone()))?;

        if stored.version != record.version {
            return Err(LifecycleError::ConcurrencyConflict(record.id));
        }

        record.version += 1;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn remove(&self, id: &str) -> LifecycleResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))
    }

    fn find_by_offender(
        &self,
        offender: &OffenderRef,
        violation_type_id: &str,
    ) -> LifecycleResult<Vec<ContraventionRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut result: Vec<_> = records
            .values()
            .filter(|r| {
                r.violation_type_id == violation_type_id && r.offender.same_offender(offender)
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.offense_time.cmp(&b.offense_time));
        Ok(result)
    }
}

fn poisoned() -> LifecycleError {
    LifecycleError::Internal("record store lock poisoned".to_string())
}
