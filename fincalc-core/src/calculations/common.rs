//! Rounding and arithmetic helpers shared by the engines.
//!
//! Currency is reported in cents and rates in millionths. Intermediate
//! balances are never rounded here; callers round only what they report.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

/// Number of decimal places kept for reported rates.
pub const RATE_DP: u32 = 6;

/// Rounds to cents, half away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use fincalc_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(5421.333)), dec!(5421.33));
/// assert_eq!(round_half_up(dec!(0.125)), dec!(0.13));
/// assert_eq!(round_half_up(dec!(-0.125)), dec!(-0.13));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncates a decimal value towards zero at two decimal places.
///
/// Used where a figure must never overstate what is affordable.
///
/// ```
/// use rust_decimal_macros::dec;
/// use fincalc_core::calculations::common::round_down;
///
/// assert_eq!(round_down(dec!(99.999)), dec!(99.99));
/// ```
pub fn round_down(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Rounds a fractional rate to [`RATE_DP`] places, half-up.
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Present value of one unit due after `periods` periods at `rate`, `(1 + rate)^-periods`.
///
/// When `(1 + rate)^periods` exceeds the decimal range its reciprocal is below
/// the smallest representable fraction, so the factor is zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use fincalc_core::calculations::common::discount_factor;
///
/// assert_eq!(discount_factor(dec!(0.25), 2), dec!(0.64));
/// assert_eq!(discount_factor(dec!(0.25), 360), dec!(0));
/// ```
pub fn discount_factor(
    rate: Decimal,
    periods: u32,
) -> Decimal {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(periods))
        .map_or(Decimal::ZERO, |growth| Decimal::ONE / growth)
}

/// The larger of `a` and `b`; used to floor figures at zero.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Divides `numerator` by `denominator`, returning zero for a zero denominator.
pub fn ratio_or_zero(
    numerator: Decimal,
    denominator: Decimal,
) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}
