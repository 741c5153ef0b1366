//! Common decimal helpers for tax calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a value to whole currency units, half away from zero.
///
/// Calculations never round internally; this is for display only.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_whole;
///
/// assert_eq!(round_whole(dec!(8320.50)), dec!(8321));
/// assert_eq!(round_whole(dec!(8320.49)), dec!(8320));
/// ```
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Floors a value at zero.
pub fn clamp_non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_whole tests
    // =========================================================================

    #[test]
    fn round_whole_rounds_up_at_midpoint() {
        assert_eq!(round_whole(dec!(2957.50)), dec!(2958));
    }

    #[test]
    fn round_whole_rounds_down_below_midpoint() {
        assert_eq!(round_whole(dec!(1861.49)), dec!(1861));
    }

    #[test]
    fn round_whole_preserves_whole_values() {
        assert_eq!(round_whole(dec!(11278.00)), dec!(11278));
    }

    // =========================================================================
    // max / clamp tests
    // =========================================================================

    #[test]
    fn max_returns_larger_value() {
        assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
        assert_eq!(max(dec!(200.00), dec!(100.00)), dec!(200.00));
    }

    #[test]
    fn clamp_non_negative_floors_negative_values() {
        assert_eq!(clamp_non_negative(dec!(-0.01)), dec!(0));
    }

    #[test]
    fn clamp_non_negative_keeps_positive_values() {
        assert_eq!(clamp_non_negative(dec!(42.5)), dec!(42.5));
    }
}
