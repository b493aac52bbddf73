//! Fine calculators
//!
//! Aggravation stacks additively on the running subtotal: the flat
//! accident penalty is added first, then the recidive surcharge is a
//! percentage of the already-aggravated amount. The two factors never
//! compound independently of each other.

use crate::error::{CalcError, CalcResult};
use fineflow_catalog::ViolationType;
use fineflow_core::amount::AmountError;
use fineflow_core::Amount;
use rust_decimal::Decimal;

/// Base amount for a violation type.
///
/// Fixed types charge `min_amount`. Variable types currently charge the
/// midpoint of `[min, max]` - a placeholder until the per-authority
/// override table is specified.
pub fn base_amount(violation_type: &ViolationType) -> CalcResult<Amount> {
    if !violation_type.variable_amount {
        return Ok(violation_type.min_amount);
    }

    let sum = violation_type
        .min_amount
        .checked_add(&violation_type.max_amount)
        .ok_or(AmountError::Overflow)?;
    let midpoint = sum
        .value()
        .checked_div(Decimal::TWO)
        .ok_or(AmountError::Overflow)?;
    Ok(Amount::new(midpoint)?)
}

/// Apply aggravating factors to a base amount.
///
/// Order is normative: accident penalty first (flat), then the recidive
/// surcharge as `recidive_percent` of the subtotal including the
/// accident penalty.
pub fn aggravated_amount(
    base: Amount,
    has_accident: bool,
    is_recidive: bool,
    accident_penalty: Option<Amount>,
    recidive_percent: Option<Decimal>,
) -> CalcResult<Amount> {
    let mut total = base;

    if has_accident {
        if let Some(penalty) = accident_penalty {
            total = total.checked_add(&penalty).ok_or(AmountError::Overflow)?;
        }
    }

    if is_recidive {
        if let Some(percent) = recidive_percent {
            if percent < Decimal::ZERO {
                return Err(CalcError::NegativeRate(percent.to_string()));
            }
            let surcharge = total.percent_of(percent)?;
            total = total.checked_add(&surcharge).ok_or(AmountError::Overflow)?;
        }
    }

    Ok(total)
}

/// One-time late penalty.
///
/// Zero while not overdue; otherwise `amount_due * percent / 100`,
/// computed against the original amount. Never compounds daily.
pub fn late_penalty(amount_due: Amount, days_overdue: i64, percent: Decimal) -> CalcResult<Amount> {
    if days_overdue <= 0 {
        return Ok(Amount::ZERO);
    }
    if percent < Decimal::ZERO {
        return Err(CalcError::NegativeRate(percent.to_string()));
    }
    Ok(amount_due.percent_of(percent)?)
}

/// Impound fee: flat transport fee plus daily holding fee.
///
/// Minimum-hold days gate release eligibility, not accrual; the daily
/// fee keeps running past the minimum until release.
pub fn impound_fee(transport_fee: Amount, daily_fee: Amount, days_held: i64) -> CalcResult<Amount> {
    let days = Decimal::from(days_held.max(0));
    let holding = daily_fee
        .value()
        .checked_mul(days)
        .ok_or(AmountError::Overflow)?;
    let total = transport_fee
        .checked_add(&Amount::new(holding)?)
        .ok_or(AmountError::Overflow)?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fineflow_catalog::ViolationCategory;
    use rust_decimal_macros::dec;

    fn amount(v: i64) -> Amount {
        Amount::new(Decimal::new(v, 0)).unwrap()
    }

    #[test]
    fn test_base_amount_fixed_uses_min() {
        let vt = ViolationType::fixed(
            "VT-1",
            "Fixed",
            "ART-1",
            ViolationCategory::Moving,
            amount(100_000),
        );
        assert_eq!(base_amount(&vt).unwrap(), amount(100_000));
    }

    #[test]
    fn test_base_amount_variable_uses_midpoint() {
        let vt = ViolationType::variable(
            "VT-2",
            "Variable",
            "ART-2",
            ViolationCategory::Moving,
            amount(250_000),
            amount(500_000),
        );
        assert_eq!(base_amount(&vt).unwrap(), amount(375_000));
    }

    #[test]
    fn test_aggravation_stacking_order_pinned() {
        // 100_000 base + 50_000 accident, then 30% of 150_000 = 45_000
        let total = aggravated_amount(
            amount(100_000),
            true,
            true,
            Some(amount(50_000)),
            Some(dec!(30)),
        )
        .unwrap();
        assert_eq!(total, amount(195_000));
    }

    #[test]
    fn test_aggravation_accident_only() {
        let total = aggravated_amount(
            amount(100_000),
            true,
            false,
            Some(amount(50_000)),
            Some(dec!(30)),
        )
        .unwrap();
        assert_eq!(total, amount(150_000));
    }

    #[test]
    fn test_aggravation_recidive_only_uses_base() {
        let total = aggravated_amount(
            amount(100_000),
            false,
            true,
            Some(amount(50_000)),
            Some(dec!(30)),
        )
        .unwrap();
        assert_eq!(total, amount(130_000));
    }

    #[test]
    fn test_aggravation_flags_without_parameters() {
        // Flags set but the type defines no penalty parameters
        let total = aggravated_amount(amount(100_000), true, true, None, None).unwrap();
        assert_eq!(total, amount(100_000));
    }

    #[test]
    fn test_late_penalty_zero_when_not_overdue() {
        assert!(late_penalty(amount(100_000), 0, dec!(2)).unwrap().is_zero());
        assert!(late_penalty(amount(100_000), -5, dec!(2)).unwrap().is_zero());
    }

    #[test]
    fn test_late_penalty_one_time_not_daily() {
        let day1 = late_penalty(amount(100_000), 1, dec!(2)).unwrap();
        let day30 = late_penalty(amount(100_000), 30, dec!(2)).unwrap();
        assert_eq!(day1, amount(2_000));
        assert_eq!(day30, day1);
    }

    #[test]
    fn test_late_penalty_negative_rate_rejected() {
        let result = late_penalty(amount(100_000), 3, dec!(-1));
        assert!(matches!(result, Err(CalcError::NegativeRate(_))));
    }

    #[test]
    fn test_impound_fee_scenario() {
        // transport 20_000 + 10_000/day * 12 days = 140_000
        let fee = impound_fee(amount(20_000), amount(10_000), 12).unwrap();
        assert_eq!(fee, amount(140_000));
    }

    #[test]
    fn test_impound_fee_clamps_negative_days() {
        let fee = impound_fee(amount(20_000), amount(10_000), -3).unwrap();
        assert_eq!(fee, amount(20_000));
    }

    #[test]
    fn test_impound_fee_keeps_accruing_past_minimum() {
        // Accrual does not stop at any minimum-hold boundary
        let day10 = impound_fee(amount(20_000), amount(10_000), 10).unwrap();
        let day11 = impound_fee(amount(20_000), amount(10_000), 11).unwrap();
        assert_eq!(day11.checked_sub(&day10).unwrap(), amount(10_000));
    }
}
