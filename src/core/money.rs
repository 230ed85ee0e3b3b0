//! Fixed-point money and percentage helpers.
//!
//! Amounts and percentages are persisted with 2 decimal places. Ratios are computed
//! on unrounded values; callers round when presenting or storing.

use crate::errors::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Tolerance used when checking that percentages add up to 100.
pub const PERCENT_TOLERANCE: Decimal = dec!(0.01);

/// One hundred percent.
pub const HUNDRED: Decimal = dec!(100);

/// Rounds an amount or percentage to 2 decimal places, halves away from zero.
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / whole * 100`, or zero when `whole` is not positive.
#[must_use]
pub fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part / whole * HUNDRED
}

/// Amount corresponding to `percentage` of `total`, rounded to 2 decimal places.
#[must_use]
pub fn amount_for_percentage(percentage: Decimal, total: Decimal) -> Decimal {
    round2(percentage / HUNDRED * total)
}

/// Whether a sum of percentages is 100 within [`PERCENT_TOLERANCE`].
#[must_use]
pub fn sums_to_hundred(total: Decimal) -> bool {
    (total - HUNDRED).abs() <= PERCENT_TOLERANCE
}

/// Rejects negative amounts.
pub fn ensure_non_negative(amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Rejects percentages outside 0-100.
pub fn ensure_percentage(value: Decimal) -> Result<()> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(Error::InvalidPercentage { value });
    }
    Ok(())
}

/// Converts a user-supplied float into a 2 decimal place amount.
pub fn decimal_from_f64(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(Error::validation(format!("{value} is not a valid number")));
    }
    Ok(round2(Decimal::try_from(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_of_zero_whole_is_zero() {
        assert_eq!(percentage_of(dec!(650), dec!(0)), Decimal::ZERO);
        assert_eq!(percentage_of(dec!(650), dec!(-10)), Decimal::ZERO);
    }

    #[test]
    fn test_percentage_of_overspent() {
        assert_eq!(round2(percentage_of(dec!(650), dec!(600))), dec!(108.33));
    }

    #[test]
    fn test_amount_for_percentage() {
        assert_eq!(amount_for_percentage(dec!(60), dec!(1000)), dec!(600));
        assert_eq!(amount_for_percentage(dec!(33.33), dec!(100)), dec!(33.33));
        assert_eq!(amount_for_percentage(dec!(12.5), dec!(99.99)), dec!(12.50));
    }

    #[test]
    fn test_sums_to_hundred_tolerance() {
        assert!(sums_to_hundred(dec!(100)));
        assert!(sums_to_hundred(dec!(99.99)));
        assert!(sums_to_hundred(dec!(100.01)));
        assert!(!sums_to_hundred(dec!(99.98)));
        assert!(!sums_to_hundred(dec!(95)));
    }

    #[test]
    fn test_ensure_percentage_bounds() {
        assert!(ensure_percentage(dec!(0)).is_ok());
        assert!(ensure_percentage(dec!(100)).is_ok());
        assert!(matches!(
            ensure_percentage(dec!(100.5)),
            Err(Error::InvalidPercentage { value: _ })
        ));
        assert!(ensure_percentage(dec!(-1)).is_err());
    }

    #[test]
    fn test_decimal_from_f64() -> Result<()> {
        assert_eq!(decimal_from_f64(12.345)?, dec!(12.35));
        assert_eq!(decimal_from_f64(650.0)?, dec!(650));
        assert!(decimal_from_f64(f64::NAN).is_err());
        assert!(decimal_from_f64(f64::INFINITY).is_err());
        Ok(())
    }
}
