//! Progressive income tax evaluation over marginal rate bands.
//!
//! The evaluator is built once per country profile from a validated
//! [`TaxTable`] and [`RebateTable`] and then answers any number of queries.
//!
//! # Calculation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Effective deductions: each capped at `min(requested, % of gross, absolute cap)` |
//! | 2    | Taxable income: gross income less deductions, minimum 0 |
//! | 3    | Gross tax: each band's rate applied to the slice of income inside it |
//! | 4    | Rebate for the age band, limited to the gross tax |
//! | 5    | Net tax: gross tax less rebate, minimum 0 |
//! | 6    | Effective rate (net tax / gross income), marginal rate, net income |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fincalc_core::calculations::BracketTaxEvaluator;
//! use fincalc_core::{AgeBand, DeductionRule, RebateTable, TaxBracket, TaxTable};
//!
//! let table = TaxTable::new(vec![
//!     TaxBracket::new(dec!(0), Some(dec!(237100)), dec!(0.18)),
//!     TaxBracket::new(dec!(237100), Some(dec!(370500)), dec!(0.26)),
//!     TaxBracket::new(dec!(370500), Some(dec!(512800)), dec!(0.31)),
//!     TaxBracket::new(dec!(512800), None, dec!(0.36)),
//! ])
//! .unwrap();
//! let rebates = RebateTable::flat(dec!(17235)).unwrap();
//! let retirement = DeductionRule {
//!     name: "retirement".to_string(),
//!     percentage_cap: Some(dec!(0.275)),
//!     absolute_cap: Some(dec!(350000)),
//! };
//!
//! let evaluator = BracketTaxEvaluator::new(&table, &rebates);
//! let result = evaluator
//!     .compute_tax(dec!(480000), &[retirement.request(dec!(93600))], AgeBand::Under65)
//!     .unwrap();
//!
//! assert_eq!(result.taxable_income, dec!(386400.00));
//! assert_eq!(result.gross_tax, dec!(82291.00));
//! assert_eq!(result.net_tax, dec!(65056.00));
//! assert_eq!(result.marginal_rate, dec!(0.31));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::{max, ratio_or_zero, round_half_up, round_rate};
use crate::{AgeBand, Deduction, RebateTable, TaxResult, TaxTable};

/// Errors raised for invalid tax calculator input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxError {
    /// Gross income must not be negative.
    #[error("gross income must not be negative, got {0}")]
    NegativeIncome(Decimal),

    /// A requested deduction was negative.
    #[error("deduction '{name}' must not be negative, got {amount}")]
    NegativeDeduction { name: String, amount: Decimal },
}

/// Bracket tax calculator for one tax table and rebate table.
#[derive(Debug, Clone, Copy)]
pub struct BracketTaxEvaluator<'a> {
    table: &'a TaxTable,
    rebates: &'a RebateTable,
}

impl<'a> BracketTaxEvaluator<'a> {
    pub fn new(
        table: &'a TaxTable,
        rebates: &'a RebateTable,
    ) -> Self {
        Self { table, rebates }
    }

    /// Computes tax owed on `gross_income`.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError`] if:
    /// - `gross_income` is negative
    /// - any requested deduction is negative
    pub fn compute_tax(
        &self,
        gross_income: Decimal,
        deductions: &[Deduction],
        age_band: AgeBand,
    ) -> Result<TaxResult, TaxError> {
        if gross_income < Decimal::ZERO {
            return Err(TaxError::NegativeIncome(gross_income));
        }

        let total_deductions = self.total_deductions(gross_income, deductions)?;
        let taxable_income = self.taxable_income(gross_income, total_deductions);
        let gross_tax = self.bracket_tax(taxable_income);
        let rebate = self.rebate(gross_tax, age_band);
        let net_tax = self.net_tax(gross_tax, rebate);
        let marginal_rate = self.table.bracket_for(taxable_income).rate;

        debug!(
            %gross_income,
            %taxable_income,
            %gross_tax,
            %rebate,
            %net_tax,
            %age_band,
            "computed bracket tax"
        );

        Ok(TaxResult {
            taxable_income,
            total_deductions,
            gross_tax,
            rebate,
            net_tax,
            effective_rate: round_rate(ratio_or_zero(net_tax, gross_income)),
            marginal_rate,
            net_income: round_half_up(gross_income - net_tax),
            monthly_tax: round_half_up(net_tax / Decimal::from(12)),
        })
    }

    /// Extra net tax caused by adding `additional` income on top of
    /// `base_income`, e.g. taxable interest from a deposit.
    ///
    /// # Errors
    ///
    /// Same as [`compute_tax`](Self::compute_tax).
    pub fn tax_on_additional_income(
        &self,
        base_income: Decimal,
        additional: Decimal,
        deductions: &[Deduction],
        age_band: AgeBand,
    ) -> Result<Decimal, TaxError> {
        let without = self.compute_tax(base_income, deductions, age_band)?;
        let with = self.compute_tax(base_income + max(additional, Decimal::ZERO), deductions, age_band)?;
        Ok(with.net_tax - without.net_tax)
    }

    /// Tax on `taxable_income` by walking the brackets slice by slice.
    pub fn bracket_tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        if taxable_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let mut tax = Decimal::ZERO;
        for bracket in self.table.brackets() {
            if taxable_income <= bracket.min {
                break;
            }
            let upper = bracket.max.map_or(taxable_income, |m| m.min(taxable_income));
            tax += bracket.rate * (upper - bracket.min);

            if bracket.max.is_none_or(|m| taxable_income <= m) {
                break;
            }
        }

        round_half_up(tax)
    }

    /// Tax on `taxable_income` from the closed form
    /// `income * rate - (rate * min - base_tax)` of the containing bracket.
    ///
    /// Independent of [`bracket_tax`](Self::bracket_tax); the two must agree.
    pub fn closed_form_tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        if taxable_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let index = self.table.bracket_index(taxable_income);
        let bracket = &self.table.brackets()[index];
        let base_tax = self.table.base_tax(index).unwrap_or(Decimal::ZERO);
        let offset = bracket.rate * bracket.min - base_tax;

        round_half_up(taxable_income * bracket.rate - offset)
    }

    /// Sums effective deductions.
    fn total_deductions(
        &self,
        gross_income: Decimal,
        deductions: &[Deduction],
    ) -> Result<Decimal, TaxError> {
        let mut total = Decimal::ZERO;
        for deduction in deductions {
            if deduction.requested < Decimal::ZERO {
                return Err(TaxError::NegativeDeduction {
                    name: deduction.name.clone(),
                    amount: deduction.requested,
                });
            }
            total += deduction.effective(gross_income);
        }
        Ok(round_half_up(total))
    }

    /// Calculates taxable income.
    fn taxable_income(
        &self,
        gross_income: Decimal,
        total_deductions: Decimal,
    ) -> Decimal {
        max(round_half_up(gross_income - total_deductions), Decimal::ZERO)
    }

    /// Rebate for the band, limited to the gross tax it offsets.
    fn rebate(
        &self,
        gross_tax: Decimal,
        age_band: AgeBand,
    ) -> Decimal {
        self.rebates.rebate(age_band).min(gross_tax)
    }

    fn net_tax(
        &self,
        gross_tax: Decimal,
        rebate: Decimal,
    ) -> Decimal {
        max(round_half_up(gross_tax - rebate), Decimal::ZERO)
    }
}
