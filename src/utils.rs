use crate::error::{PlannerError, Result};
use crate::schema::{Money, MonthlyVector};

pub const MONTHS_PER_YEAR: usize = 12;

/// Largest amount that survives a round trip through `f64` without losing
/// integer precision (2^53 - 1).
pub const MAX_EXACT_MONEY: Money = 9_007_199_254_740_991;

/// Integer division rounded half away from zero.
///
/// # Examples
/// - `round_div(5, 2) == 3`
/// - `round_div(-5, 2) == -3`
/// - `round_div(4, 3) == 1`
pub fn round_div(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator != 0, "round_div by zero");
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;

    if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) == (denominator < 0) {
            quotient + 1
        } else {
            quotient - 1
        }
    } else {
        quotient
    }
}

/// Rounds a floating point amount half away from zero into whole money units.
/// Non-finite input collapses to zero; out-of-range input saturates.
pub fn round_money(value: f64) -> Money {
    if !value.is_finite() {
        return 0;
    }
    value.round() as Money
}

/// Clamps an i128 intermediate back into the money range.
pub fn saturate_money(value: i128) -> Money {
    value.clamp(Money::MIN as i128, Money::MAX as i128) as Money
}

pub fn sum_months(values: &MonthlyVector) -> Money {
    saturate_money(values.iter().map(|&v| v as i128).sum())
}

/// Validates a 1-based month number and returns its 0-based index.
pub fn month_index(month: usize) -> Result<usize> {
    if !(1..=MONTHS_PER_YEAR).contains(&month) {
        return Err(PlannerError::InvalidMonth(month));
    }
    Ok(month - 1)
}

/// Grid label for a 0-based month index, e.g. `M01` for January.
pub fn month_label(index: usize) -> String {
    format!("M{:02}", index + 1)
}
