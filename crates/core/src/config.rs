//! System configuration with configurable windows and rates
//!
//! All windows and rates are configurable via file, not hardcoded.
//! The value is immutable once a component is constructed with it;
//! a configuration change takes effect by rebuilding the engines.

use chrono::{Duration, Months};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for the compliance engine
///
/// All values can be overridden via a JSON config file.
/// Defaults follow the standard enforcement schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // === Payment windows ===
    /// Days an offender has to pay from the offense date
    #[serde(default = "default_standard_payment_window_days")]
    pub standard_payment_window_days: i64,

    /// Shortened window for on-the-spot settlement offers
    #[serde(default = "default_immediate_payment_window_days")]
    pub immediate_payment_window_days: i64,

    /// One-time late penalty, in whole percent of the amount due
    #[serde(default = "default_late_penalty_percent")]
    pub late_penalty_percent: Decimal,

    // === Cancellation ===
    /// Hours after creation during which the issuing agent may cancel directly
    #[serde(default = "default_direct_cancellation_window_hours")]
    pub direct_cancellation_window_hours: i64,

    // === Contestation ===
    /// Days the payment deadline is suspended while a contestation is open
    #[serde(default = "default_contestation_window_days")]
    pub contestation_window_days: i64,

    /// Minimum length of a contestation justification text
    #[serde(default = "default_contestation_min_justification_len")]
    pub contestation_min_justification_len: usize,

    // === Recidive ===
    /// Trailing window for repeat-offense detection, in calendar months
    #[serde(default = "default_recidive_window_months")]
    pub recidive_window_months: u32,

    // === Impound defaults ===
    /// Flat towing/transport fee charged once at intake
    #[serde(default = "default_impound_transport_fee")]
    pub impound_transport_fee: Decimal,

    /// Holding fee charged per started day
    #[serde(default = "default_impound_daily_fee")]
    pub impound_daily_fee: Decimal,

    /// Days a vehicle must be held before it is eligible for release
    #[serde(default = "default_impound_minimum_hold_days")]
    pub impound_minimum_hold_days: i64,
}

// Default value functions for serde
fn default_standard_payment_window_days() -> i64 {
    14
}

fn default_immediate_payment_window_days() -> i64 {
    3
}

fn default_late_penalty_percent() -> Decimal {
    Decimal::new(2, 0)
}

fn default_direct_cancellation_window_hours() -> i64 {
    24
}

fn default_contestation_window_days() -> i64 {
    90
}

fn default_contestation_min_justification_len() -> usize {
    40
}

fn default_recidive_window_months() -> u32 {
    12
}

fn default_impound_transport_fee() -> Decimal {
    Decimal::new(20_000, 0)
}

fn default_impound_daily_fee() -> Decimal {
    Decimal::new(10_000, 0)
}

fn default_impound_minimum_hold_days() -> i64 {
    10
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            standard_payment_window_days: default_standard_payment_window_days(),
            immediate_payment_window_days: default_immediate_payment_window_days(),
            late_penalty_percent: default_late_penalty_percent(),
            direct_cancellation_window_hours: default_direct_cancellation_window_hours(),
            contestation_window_days: default_contestation_window_days(),
            contestation_min_justification_len: default_contestation_min_justification_len(),
            recidive_window_months: default_recidive_window_months(),
            impound_transport_fee: default_impound_transport_fee(),
            impound_daily_fee: default_impound_daily_fee(),
            impound_minimum_hold_days: default_impound_minimum_hold_days(),
        }
    }
}

impl SystemConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Standard payment window as a chrono Duration
    pub fn standard_payment_window(&self) -> Duration {
        Duration::days(self.standard_payment_window_days)
    }

    /// Direct-cancellation window as a chrono Duration
    pub fn direct_cancellation_window(&self) -> Duration {
        Duration::hours(self.direct_cancellation_window_hours)
    }

    /// Deadline suspension applied when a contestation is submitted
    pub fn contestation_window(&self) -> Duration {
        Duration::days(self.contestation_window_days)
    }

    /// Recidive lookback as calendar months
    pub fn recidive_window(&self) -> Months {
        Months::new(self.recidive_window_months)
    }
}
