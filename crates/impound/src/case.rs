//! Impound cases and their storage seam

use crate::error::{ImpoundError, ImpoundResult};
use chrono::{DateTime, Utc};
use fineflow_core::Amount;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use strum_macros::{Display, EnumString};

/// Impound case status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImpoundStatus {
    Held,
    Released,
    /// Vehicle disposed of after the statutory abandonment period
    Auctioned,
}

impl ImpoundStatus {
    pub fn is_final(self) -> bool {
        matches!(self, ImpoundStatus::Released | ImpoundStatus::Auctioned)
    }
}

/// A vehicle held at the pound, tied to exactly one contravention.
///
/// The fee parameters are snapshotted from configuration at intake so
/// that later configuration changes never reprice an open case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpoundCase {
    pub id: String,
    pub record_id: String,
    pub intake_time: DateTime<Utc>,
    /// Pound/lot where the vehicle is held
    pub location: String,
    pub transport_fee: Amount,
    pub daily_fee: Amount,
    pub minimum_hold_days: i64,
    pub status: ImpoundStatus,
    pub released_at: Option<DateTime<Utc>>,
}

impl ImpoundCase {
    /// Whole days in custody so far; the clock stops at release.
    pub fn days_held(&self, now: DateTime<Utc>) -> i64 {
        let until = self.released_at.unwrap_or(now);
        (until - self.intake_time).num_days()
    }
}

/// Storage for impound cases
pub trait ImpoundStore: Send + Sync {
    fn insert(&self, case: ImpoundCase) -> ImpoundResult<()>;

    fn get(&self, id: &str) -> ImpoundResult<ImpoundCase>;

    fn update(&self, case: ImpoundCase) -> ImpoundResult<ImpoundCase>;

    /// Remove a case. Only used to unwind an open whose audit append
    /// failed; never part of normal operation.
    fn remove(&self, id: &str) -> ImpoundResult<()>;

    /// The case for a record regardless of status, if any. A case is
    /// 1:1 with its contravention, released or not.
    fn find_by_record(&self, record_id: &str) -> ImpoundResult<Option<ImpoundCase>>;

    /// The Held case for a record, if any
    fn held_for_record(&self, record_id: &str) -> ImpoundResult<Option<ImpoundCase>>;
}

/// Reference in-memory store
#[derive(Default)]
pub struct InMemoryImpoundStore {
    cases: RwLock<HashMap<String, ImpoundCase>>,
}

impl InMemoryImpoundStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImpoundStore for InMemoryImpoundStore {
    fn insert(&self, case: ImpoundCase) -> ImpoundResult<()> {
        let mut cases = self.cases.write().map_err(|_| poisoned())?;
        if cases.contains_key(&case.id) {
            return Err(ImpoundError::Validation(format!(
                "impound case already exists: {}",
                case.id
            )));
        }
        cases.insert(case.id.clone(), case);
        Ok(())
    }

    fn get(&self, id: &str) -> ImpoundResult<ImpoundCase> {
        self.cases
            .read()
            .map_err(|_| poisoned())?
            .get(id)
            .cloned()
            .ok_or_else(|| ImpoundError::NotFound(id.to_string()))
    }

    fn update(&self, case: ImpoundCase) -> ImpoundResult<ImpoundCase> {
        let mut cases = self.cases.write().map_err(|_| poisoned())?;
        if !cases.contains_key(&case.id) {
            return Err(ImpoundError::NotFound(case.id));
        }
        cases.insert(case.id.clone(), case.clone());
        Ok(case)
    }

    fn remove(&self, id: &str) -> ImpoundResult<()> {
        let mut cases = self.cases.write().map_err(|_| poisoned())?;
        cases
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ImpoundError::NotFound(id.to_string()))
    }

    fn find_by_record(&self, record_id: &str) -> ImpoundResult<Option<ImpoundCase>> {
        Ok(self
            .cases
            .read()
            .map_err(|_| poisoned())?
            .values()
            .find(|c| c.record_id == record_id)
            .cloned())
    }

    fn held_for_record(&self, record_id: &str) -> ImpoundResult<Option<ImpoundCase>> {
        Ok(self
            .cases
            .read()
            .map_err(|_| poisoned())?
            .values()
            .find(|c| c.record_id == record_id && c.status == ImpoundStatus::Held)
            .cloned())
    }
}

fn poisoned() -> ImpoundError {
    ImpoundError::Internal("impound store lock poisoned".to_string())
}
