//! Compound growth of a deposit with optional regular contributions.
//!
//! Each compounding period applies
//! `balance = balance * (1 + annual_rate / frequency) + contribution`
//! where the contribution is the monthly contribution spread over the
//! compounding period (`monthly * 12 / frequency`).
//!
//! Only complete compounding periods are capitalised: the projection runs
//! `floor(term_months * frequency / 12)` periods.
//!
//! The balance and the per-period contribution are carried at full
//! precision. Reported figures are rounded to cents: a row's contribution is
//! the step in rounded cumulative contributions, and its interest is what
//! remains of the step in rounded balances, so rows always chain and sum to
//! the totals.
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fincalc_core::calculations::compound_growth::compute_growth;
//! use fincalc_core::{CompoundingFrequency, DepositTerms};
//!
//! let terms = DepositTerms::new(dec!(10000), dec!(0.0925), CompoundingFrequency::Monthly, 12);
//! let result = compute_growth(&terms).unwrap();
//!
//! assert_eq!(result.terminal_value, dec!(10965.24));
//! assert_eq!(result.total_interest, dec!(965.24));
//! ```

use rust_decimal::{Decimal, MathematicalOps};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::{max, round_half_up};
use crate::{DepositTerms, GrowthPeriod, GrowthResult};

/// Errors raised for invalid deposit input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrowthError {
    #[error("principal must not be negative, got {0}")]
    NegativePrincipal(Decimal),

    #[error("term must be at least one month, got {0}")]
    NonPositiveTerm(i32),

    #[error("monthly contribution must not be negative, got {0}")]
    NegativeContribution(Decimal),

    #[error("interest exemption must not be negative, got {0}")]
    NegativeExemption(Decimal),

    #[error("annual rate {rate} would wipe out the balance when compounded {frequency} times a year")]
    RateTooNegative { rate: Decimal, frequency: u32 },

    #[error("deposit balance would exceed the representable decimal range")]
    Overflow,
}

/// Terminal value, interest and taxable interest for `terms`.
///
/// Pure: the same terms always produce the same result.
///
/// # Errors
///
/// Returns [`GrowthError`] if the principal, contribution or exemption is
/// negative, the term is not positive, the periodic rate is `-100%` or less,
/// or the balance could grow past the decimal range.
pub fn compute_growth(terms: &DepositTerms) -> Result<GrowthResult, GrowthError> {
    let periods = period_breakdown(terms)?;
    let final_balance = periods.iter().fold(periods.principal, |_, p| p.closing_balance);

    let terminal_value = round_half_up(final_balance);
    let total_contributions = periods.contributed_through(periods.count);
    let total_interest = terminal_value - periods.principal - total_contributions;
    let exemption = terms.interest_exemption.unwrap_or(Decimal::ZERO);
    let taxable_interest = max(total_interest - exemption, Decimal::ZERO);

    debug!(
        principal = %terms.principal,
        rate = %terms.annual_rate,
        compounding = %terms.compounding,
        periods = periods.count,
        %terminal_value,
        %total_interest,
        %taxable_interest,
        "computed deposit growth"
    );

    Ok(GrowthResult {
        terminal_value,
        total_contributions,
        total_interest,
        taxable_interest,
        periods: periods.count,
    })
}

/// Validates `terms` and returns the per-period breakdown.
///
/// The breakdown is lazy and restartable: every call to
/// [`GrowthPeriods::iter`] starts again from the principal.
///
/// # Errors
///
/// Same as [`compute_growth`].
pub fn period_breakdown(terms: &DepositTerms) -> Result<GrowthPeriods, GrowthError> {
    if terms.principal < Decimal::ZERO {
        return Err(GrowthError::NegativePrincipal(terms.principal));
    }
    if terms.term_months <= 0 {
        return Err(GrowthError::NonPositiveTerm(terms.term_months));
    }
    let monthly = terms.monthly_contribution.unwrap_or(Decimal::ZERO);
    if monthly < Decimal::ZERO {
        return Err(GrowthError::NegativeContribution(monthly));
    }
    if let Some(exemption) = terms.interest_exemption {
        if exemption < Decimal::ZERO {
            return Err(GrowthError::NegativeExemption(exemption));
        }
    }

    let frequency = terms.compounding.periods_per_year();
    let periodic_rate = terms.annual_rate / Decimal::from(frequency);
    if periodic_rate <= -Decimal::ONE {
        return Err(GrowthError::RateTooNegative {
            rate: terms.annual_rate,
            frequency,
        });
    }

    // term_months is positive here, so the cast is lossless.
    let count = (terms.term_months as u32).saturating_mul(frequency) / 12;
    let growth_factor = Decimal::ONE + periodic_rate;
    let annual_contribution = monthly * Decimal::from(12);

    if balance_ceiling(terms.principal, growth_factor, annual_contribution, frequency, count).is_none() {
        return Err(GrowthError::Overflow);
    }

    Ok(GrowthPeriods {
        principal: terms.principal,
        growth_factor,
        annual_contribution,
        contribution: annual_contribution / Decimal::from(frequency),
        frequency,
        count,
    })
}

/// Upper bound on every balance the projection reaches:
/// `(principal + contributions) * max(growth_factor, 1)^count`.
///
/// `None` when the bound leaves the decimal range, which guarantees the
/// unchecked arithmetic in [`GrowthPeriodIter`] cannot overflow.
fn balance_ceiling(
    principal: Decimal,
    growth_factor: Decimal,
    annual_contribution: Decimal,
    frequency: u32,
    count: u32,
) -> Option<Decimal> {
    let compounded = growth_factor.max(Decimal::ONE).checked_powu(u64::from(count))?;
    let contributions = annual_contribution.checked_mul(Decimal::from(count))? / Decimal::from(frequency);
    principal.checked_add(contributions)?.checked_mul(compounded)
}

/// A finite, restartable sequence of [`GrowthPeriod`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrowthPeriods {
    principal: Decimal,
    growth_factor: Decimal,
    annual_contribution: Decimal,
    contribution: Decimal,
    frequency: u32,
    count: u32,
}

impl GrowthPeriods {
    /// A fresh iterator from the first period.
    pub fn iter(&self) -> GrowthPeriodIter<'_> {
        GrowthPeriodIter {
            source: self,
            next_period: 1,
            balance: self.principal,
        }
    }

    /// Number of compounding periods.
    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Contribution added at the end of every period, unrounded.
    pub fn contribution_per_period(&self) -> Decimal {
        self.contribution
    }

    /// Contributions paid in over the first `periods` periods, rounded to cents.
    fn contributed_through(
        &self,
        periods: u32,
    ) -> Decimal {
        round_half_up(self.annual_contribution * Decimal::from(periods) / Decimal::from(self.frequency))
    }
}

impl<'a> IntoIterator for &'a GrowthPeriods {
    type Item = GrowthPeriod;
    type IntoIter = GrowthPeriodIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`GrowthPeriods`] sequence.
#[derive(Debug, Clone)]
pub struct GrowthPeriodIter<'a> {
    source: &'a GrowthPeriods,
    next_period: u32,
    balance: Decimal,
}

impl Iterator for GrowthPeriodIter<'_> {
    type Item = GrowthPeriod;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_period > self.source.count {
            return None;
        }

        let opening = self.balance;
        self.balance = opening * self.source.growth_factor + self.source.contribution;

        let opening_balance = round_half_up(opening);
        let closing_balance = round_half_up(self.balance);
        let contribution = self.source.contributed_through(self.next_period)
            - self.source.contributed_through(self.next_period - 1);
        let period = GrowthPeriod {
            period: self.next_period,
            opening_balance,
            interest: closing_balance - opening_balance - contribution,
            contribution,
            closing_balance,
        };
        self.next_period += 1;
        Some(period)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.source.count + 1).saturating_sub(self.next_period) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GrowthPeriodIter<'_> {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::CompoundingFrequency;

    fn fixed_deposit() -> DepositTerms {
        DepositTerms::new(dec!(10000), dec!(0.0925), CompoundingFrequency::Monthly, 12)
    }

    // =========================================================================
    // compute_growth tests
    // =========================================================================

    #[test]
    fn monthly_compounding_fixed_deposit() {
        let result = compute_growth(&fixed_deposit()).unwrap();

        assert_eq!(
            result,
            GrowthResult {
                terminal_value: dec!(10965.24),
                total_contributions: dec!(0),
                total_interest: dec!(965.24),
                taxable_interest: dec!(965.24),
                periods: 12,
            }
        );
    }

    #[test]
    fn annual_compounding_is_simple_for_one_year() {
        let terms = DepositTerms::new(dec!(10000), dec!(0.0925), CompoundingFrequency::Annually, 12);

        let result = compute_growth(&terms).unwrap();

        assert_eq!(result.terminal_value, dec!(10925.00));
    }

    #[test]
    fn more_frequent_compounding_earns_more() {
        let mut terms = fixed_deposit();
        terms.compounding = CompoundingFrequency::Daily;
        let daily = compute_growth(&terms).unwrap();
        terms.compounding = CompoundingFrequency::Quarterly;
        let quarterly = compute_growth(&terms).unwrap();

        let monthly = compute_growth(&fixed_deposit()).unwrap();

        assert_eq!(daily.periods, 365);
        assert!(daily.terminal_value > monthly.terminal_value);
        assert!(monthly.terminal_value > quarterly.terminal_value);
    }

    #[test]
    fn zero_rate_returns_principal_unchanged() {
        let terms = DepositTerms::new(dec!(10000), dec!(0), CompoundingFrequency::Monthly, 24);

        let result = compute_growth(&terms).unwrap();

        assert_eq!(result.terminal_value, dec!(10000));
        assert_eq!(result.total_interest, dec!(0));
    }

    #[test]
    fn contributions_are_added_each_period() {
        let terms = DepositTerms::new(dec!(0), dec!(0), CompoundingFrequency::Monthly, 12)
            .with_contribution(dec!(500));

        let result = compute_growth(&terms).unwrap();

        assert_eq!(result.terminal_value, dec!(6000));
        assert_eq!(result.total_contributions, dec!(6000));
        assert_eq!(result.total_interest, dec!(0));
    }

    #[test]
    fn quarterly_compounding_groups_monthly_contributions() {
        let terms = DepositTerms::new(dec!(0), dec!(0), CompoundingFrequency::Quarterly, 12)
            .with_contribution(dec!(100));

        let breakdown = period_breakdown(&terms).unwrap();

        assert_eq!(breakdown.len(), 4);
        assert_eq!(breakdown.contribution_per_period(), dec!(300));
    }

    #[test]
    fn daily_contributions_total_the_monthly_amounts() {
        // 100 a month is 3.2876... a day; rounding each day would pay in 1200.85.
        let terms = DepositTerms::new(dec!(0), dec!(0.0925), CompoundingFrequency::Daily, 12)
            .with_contribution(dec!(100));

        let result = compute_growth(&terms).unwrap();
        let rows: Vec<GrowthPeriod> = period_breakdown(&terms).unwrap().iter().collect();
        let contributed: Decimal = rows.iter().map(|r| r.contribution).sum();
        let earned: Decimal = rows.iter().map(|r| r.interest).sum();

        assert_eq!(result.total_contributions, dec!(1200));
        assert_eq!(contributed, dec!(1200));
        assert_eq!(earned, result.total_interest);
        assert_eq!(result.terminal_value, result.total_contributions + result.total_interest);
        assert!(result.total_interest > Decimal::ZERO);
    }

    #[test]
    fn zero_rate_daily_contributions_earn_nothing() {
        let terms = DepositTerms::new(dec!(0), dec!(0), CompoundingFrequency::Daily, 12)
            .with_contribution(dec!(100));

        let result = compute_growth(&terms).unwrap();

        assert_eq!(result.terminal_value, dec!(1200));
        assert_eq!(result.total_interest, dec!(0));
        assert!(period_breakdown(&terms).unwrap().iter().all(|r| r.interest.is_zero()));
    }

    #[test]
    fn interest_exemption_reduces_taxable_interest() {
        let terms = fixed_deposit().with_exemption(dec!(500));

        let result = compute_growth(&terms).unwrap();

        assert_eq!(result.taxable_interest, dec!(465.24));
    }

    #[test]
    fn exemption_above_interest_floors_at_zero() {
        let terms = fixed_deposit().with_exemption(dec!(23800));

        let result = compute_growth(&terms).unwrap();

        assert_eq!(result.taxable_interest, dec!(0));
    }

    #[test]
    fn negative_rate_shrinks_balance() {
        let terms = DepositTerms::new(dec!(10000), dec!(-0.12), CompoundingFrequency::Annually, 12);

        let result = compute_growth(&terms).unwrap();

        assert_eq!(result.terminal_value, dec!(8800.00));
        assert_eq!(result.total_interest, dec!(-1200.00));
        assert_eq!(result.taxable_interest, dec!(0));
    }

    #[test]
    fn partial_period_is_not_capitalised() {
        let terms = DepositTerms::new(dec!(10000), dec!(0.10), CompoundingFrequency::Annually, 6);

        let result = compute_growth(&terms).unwrap();

        assert_eq!(result.periods, 0);
        assert_eq!(result.terminal_value, dec!(10000));
    }

    #[test]
    fn compute_growth_is_bit_identical_across_calls() {
        let terms = fixed_deposit().with_contribution(dec!(250)).with_exemption(dec!(100));

        let first = compute_growth(&terms).unwrap();
        let second = compute_growth(&terms).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.terminal_value.serialize(), second.terminal_value.serialize());
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn rejects_negative_principal() {
        let terms = DepositTerms::new(dec!(-1), dec!(0.05), CompoundingFrequency::Monthly, 12);

        assert_eq!(compute_growth(&terms), Err(GrowthError::NegativePrincipal(dec!(-1))));
    }

    #[test]
    fn rejects_zero_term() {
        let terms = DepositTerms::new(dec!(1000), dec!(0.05), CompoundingFrequency::Monthly, 0);

        assert_eq!(compute_growth(&terms), Err(GrowthError::NonPositiveTerm(0)));
    }

    #[test]
    fn rejects_negative_contribution() {
        let terms = fixed_deposit().with_contribution(dec!(-10));

        assert_eq!(compute_growth(&terms), Err(GrowthError::NegativeContribution(dec!(-10))));
    }

    #[test]
    fn rejects_rate_that_wipes_out_balance() {
        let terms = DepositTerms::new(dec!(1000), dec!(-1), CompoundingFrequency::Annually, 12);

        assert_eq!(
            compute_growth(&terms),
            Err(GrowthError::RateTooNegative {
                rate: dec!(-1),
                frequency: 1,
            })
        );
    }

    #[test]
    fn rejects_balance_beyond_decimal_range() {
        // 100% a year compounded monthly for a century grows about 5e41 times.
        let terms = DepositTerms::new(dec!(10000), dec!(1), CompoundingFrequency::Monthly, 1200);

        assert_eq!(compute_growth(&terms), Err(GrowthError::Overflow));
        assert_eq!(period_breakdown(&terms), Err(GrowthError::Overflow));
    }

    #[test]
    fn long_ordinary_projection_is_in_range() {
        let terms = DepositTerms::new(dec!(1000000), dec!(0.10), CompoundingFrequency::Daily, 480)
            .with_contribution(dec!(5000));

        let result = compute_growth(&terms).unwrap();

        assert_eq!(result.periods, 14600);
        assert_eq!(result.total_contributions, dec!(2400000));
    }

    // =========================================================================
    // period_breakdown tests
    // =========================================================================

    #[test]
    fn breakdown_rows_chain_and_end_at_terminal_value() {
        let terms = fixed_deposit().with_contribution(dec!(250));
        let breakdown = period_breakdown(&terms).unwrap();
        let rows: Vec<GrowthPeriod> = breakdown.iter().collect();

        assert_eq!(rows.len(), 12);
        for pair in rows.windows(2) {
            assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
        }
        for row in &rows {
            assert_eq!(row.closing_balance, row.opening_balance + row.interest + row.contribution);
        }
        assert_eq!(
            rows.last().unwrap().closing_balance,
            compute_growth(&terms).unwrap().terminal_value
        );
    }

    #[test]
    fn breakdown_is_restartable() {
        let breakdown = period_breakdown(&fixed_deposit()).unwrap();

        let first: Vec<GrowthPeriod> = breakdown.iter().collect();
        let second: Vec<GrowthPeriod> = (&breakdown).into_iter().collect();

        assert_eq!(first, second);
        assert_eq!(breakdown.iter().len(), 12);
    }

    #[test]
    fn breakdown_first_row() {
        let breakdown = period_breakdown(&fixed_deposit()).unwrap();

        let first = breakdown.iter().next().unwrap();

        // 10 000 * 0.0925 / 12 = 77.083...
        assert_eq!(
            first,
            GrowthPeriod {
                period: 1,
                opening_balance: dec!(10000),
                interest: dec!(77.08),
                contribution: dec!(0),
                closing_balance: dec!(10077.08),
            }
        );
    }
}
