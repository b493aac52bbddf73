//! Fineflow Calc - pure financial calculators
//!
//! Everything here is a pure function over `Amount` and `Decimal`:
//! no clock, no storage, no side effects. The stacking order of the
//! aggravation factors is pinned by tests and must not change.

pub mod calculator;
pub mod error;

pub use calculator::{aggravated_amount, base_amount, impound_fee, late_penalty};
pub use error::CalcError;
