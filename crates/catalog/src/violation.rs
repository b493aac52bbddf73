//! Violation types - the static reference data a contravention points at

use fineflow_core::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Violation categories - a closed set.
///
/// Adding a category is a compile-time-visible change everywhere the
/// category is matched on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViolationCategory {
    /// License, registration, plate offenses
    Administrative,
    /// Speeding, red lights, wrong-way driving
    Moving,
    /// Illegal stopping and parking
    Parking,
    /// Missing or defective vehicle equipment
    Equipment,
    /// Missing mandatory documents at control time
    Documentation,
}

impl ViolationCategory {
    /// Categories whose fines are typically settled on the spot
    pub fn allows_immediate_settlement(&self) -> bool {
        match self {
            ViolationCategory::Parking | ViolationCategory::Documentation => true,
            ViolationCategory::Administrative
            | ViolationCategory::Moving
            | ViolationCategory::Equipment => false,
        }
    }
}

/// A violation type from the infraction catalog.
///
/// Amounts are a range `[min_amount, max_amount]`; fixed-amount types
/// carry `min == max` and `variable_amount == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationType {
    pub id: String,
    pub name: String,
    pub legal_code: String,
    pub category: ViolationCategory,
    pub min_amount: Amount,
    pub max_amount: Amount,
    pub variable_amount: bool,
    /// Flat penalty added when the offense caused an accident
    pub accident_penalty: Option<Amount>,
    /// Surcharge in whole percent applied on repeat offenses
    pub recidive_percent: Option<Decimal>,
    /// Whether the vehicle is impounded when this type is recorded
    pub requires_impound: bool,
    pub active: bool,
}

impl ViolationType {
    /// Fixed-amount type (min == max)
    pub fn fixed(
        id: impl Into<String>,
        name: impl Into<String>,
        legal_code: impl Into<String>,
        category: ViolationCategory,
        amount: Amount,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            legal_code: legal_code.into(),
            category,
            min_amount: amount,
            max_amount: amount,
            variable_amount: false,
            accident_penalty: None,
            recidive_percent: None,
            requires_impound: false,
            active: true,
        }
    }

    /// Variable-amount type over `[min, max]`
    pub fn variable(
        id: impl Into<String>,
        name: impl Into<String>,
        legal_code: impl Into<String>,
        category: ViolationCategory,
        min: Amount,
        max: Amount,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            legal_code: legal_code.into(),
            category,
            min_amount: min,
            max_amount: max,
            variable_amount: true,
            accident_penalty: None,
            recidive_percent: None,
            requires_impound: false,
            active: true,
        }
    }

    pub fn with_accident_penalty(mut self, penalty: Amount) -> Self {
        self.accident_penalty = Some(penalty);
        self
    }

    pub fn with_recidive_percent(mut self, percent: Decimal) -> Self {
        self.recidive_percent = Some(percent);
        self
    }

    pub fn with_impound(mut self) -> Self {
        self.requires_impound = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}
