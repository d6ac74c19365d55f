//! Equal-installment loan amortization with optional deposit and balloon.
//!
//! The balloon is a lump sum due with the last installment. It is not
//! amortized: the regular installment is the payment that runs the financed
//! amount down to exactly the balloon over the term.
//!
//! | Symbol | Meaning |
//! |--------|---------|
//! | `r`    | monthly rate, `annual_rate / 12` |
//! | `n`    | term in months |
//! | `P`    | financed amount, `principal - deposit` |
//! | `B`    | balloon, `balloon_percent * principal` |
//!
//! `installment = (P - B * v) * r / (1 - v)` with `v = (1 + r)^-n`, or
//! `(P - B) / n` when `r` is zero. When `(1 + r)^n` leaves the decimal range
//! `v` is zero and the installment is the interest-only payment `P * r`.
//!
//! Interest is rounded to cents every period, so the last period's payment
//! absorbs the accumulated rounding and closes the schedule on `B` exactly.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fincalc_core::calculations::AmortizationEngine;
//! use fincalc_core::{LoanProduct, LoanTerms};
//!
//! let engine = AmortizationEngine::new(LoanProduct::vehicle_finance());
//! let terms = LoanTerms::new(dec!(200000), dec!(0.1175), 72).with_balloon(dec!(0.30));
//!
//! let schedule = engine.compute_schedule(&terms).unwrap();
//!
//! assert_eq!(schedule.installment, dec!(3306.36));
//! assert_eq!(schedule.periods.len(), 72);
//! assert_eq!(schedule.final_period().unwrap().closing_balance, dec!(60000));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, trace};

use crate::calculations::common::{discount_factor, round_down, round_half_up};
use crate::{AmortizationPeriod, AmortizationSchedule, LoanProduct, LoanTerms};

/// Errors raised for invalid loan input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoanError {
    #[error("principal must be positive, got {0}")]
    NonPositivePrincipal(Decimal),

    #[error("annual rate must not be negative, got {0}")]
    NegativeRate(Decimal),

    #[error("term must be at least one month, got {0}")]
    NonPositiveTerm(i32),

    #[error("term of {term} months is outside the {product} range of {min}-{max} months")]
    TermOutOfRange {
        product: String,
        term: i32,
        min: u32,
        max: u32,
    },

    #[error("deposit must not be negative, got {0}")]
    NegativeDeposit(Decimal),

    #[error("deposit {deposit} must be less than the principal {principal}")]
    DepositTooLarge { deposit: Decimal, principal: Decimal },

    #[error("balloon percentage must not be negative, got {0}")]
    NegativeBalloon(Decimal),

    #[error("balloon of {requested} exceeds the {product} maximum of {max}")]
    BalloonTooLarge {
        product: String,
        requested: Decimal,
        max: Decimal,
    },

    #[error("balloon {balloon} must be less than the financed amount {financed}")]
    BalloonExceedsFinancedAmount { balloon: Decimal, financed: Decimal },

    #[error("installment must be positive, got {0}")]
    NonPositiveInstallment(Decimal),

    #[error("{months_paid} months paid exceeds the {term} month term")]
    MonthsPaidOutOfRange { months_paid: u32, term: i32 },

    #[error("loan figures exceed the representable decimal range")]
    Overflow,
}

/// Loan inputs after validation.
#[derive(Debug, Clone, Copy)]
struct Financing {
    financed: Decimal,
    balloon: Decimal,
    monthly_rate: Decimal,
    months: u32,
}

/// Amortization calculator bound to one [`LoanProduct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmortizationEngine {
    product: LoanProduct,
}

impl AmortizationEngine {
    pub fn new(product: LoanProduct) -> Self {
        Self { product }
    }

    pub fn product(&self) -> &LoanProduct {
        &self.product
    }

    /// Builds the full repayment schedule for `terms`.
    ///
    /// # Errors
    ///
    /// Returns [`LoanError`] if:
    /// - the principal is not positive or the rate is negative
    /// - the term is not positive or lies outside the product's bounds
    /// - the deposit is negative or not below the principal
    /// - the balloon is negative, above the product maximum, or not below the
    ///   financed amount
    /// - an amount in the schedule exceeds the decimal range
    pub fn compute_schedule(
        &self,
        terms: &LoanTerms,
    ) -> Result<AmortizationSchedule, LoanError> {
        let financing = self.validate(terms)?;
        let installment = Self::installment_for(&financing)?;
        let Financing {
            financed,
            balloon,
            monthly_rate,
            months,
        } = financing;

        let mut periods = Vec::with_capacity(months as usize);
        let mut balance = financed;
        let mut total_interest = Decimal::ZERO;
        let mut total_payments = Decimal::ZERO;

        for period in 1..=months {
            let opening_balance = balance;
            let interest = round_half_up(
                opening_balance
                    .checked_mul(monthly_rate)
                    .ok_or(LoanError::Overflow)?,
            );
            let mut payment = installment;
            let mut principal_portion = payment - interest;
            let mut closing_balance = opening_balance - principal_portion;

            if period == months {
                let drift = closing_balance - balloon;
                if !drift.is_zero() {
                    debug!(%drift, %balloon, "correcting final period rounding drift");
                }
                principal_portion = opening_balance - balloon;
                payment = principal_portion
                    .checked_add(interest)
                    .ok_or(LoanError::Overflow)?;
                closing_balance = balloon;
            }

            trace!(period, %opening_balance, %interest, %payment, %closing_balance);

            total_interest = total_interest
                .checked_add(interest)
                .ok_or(LoanError::Overflow)?;
            total_payments = total_payments
                .checked_add(payment)
                .ok_or(LoanError::Overflow)?;
            balance = closing_balance;
            periods.push(AmortizationPeriod {
                period,
                opening_balance,
                interest,
                principal_portion,
                payment,
                closing_balance,
            });
        }

        debug!(
            product = %self.product.name,
            %financed,
            %balloon,
            %installment,
            %total_interest,
            months,
            "computed amortization schedule"
        );

        Ok(AmortizationSchedule {
            financed_amount: financed,
            balloon,
            installment,
            total_interest,
            total_paid: total_payments
                .checked_add(balloon)
                .ok_or(LoanError::Overflow)?,
            periods,
        })
    }

    /// The regular monthly installment for `terms`.
    ///
    /// # Errors
    ///
    /// Same as [`compute_schedule`](Self::compute_schedule).
    pub fn installment(
        &self,
        terms: &LoanTerms,
    ) -> Result<Decimal, LoanError> {
        let financing = self.validate(terms)?;
        Self::installment_for(&financing)
    }

    /// Outstanding balance after `months_paid` installments, the figure a
    /// lender quotes to settle early. After the full term this is the balloon.
    ///
    /// # Errors
    ///
    /// Returns [`LoanError::MonthsPaidOutOfRange`] if `months_paid` exceeds the
    /// term, otherwise the same as [`compute_schedule`](Self::compute_schedule).
    pub fn settlement_balance(
        &self,
        terms: &LoanTerms,
        months_paid: u32,
    ) -> Result<Decimal, LoanError> {
        let schedule = self.compute_schedule(terms)?;
        if months_paid as usize > schedule.periods.len() {
            return Err(LoanError::MonthsPaidOutOfRange {
                months_paid,
                term: terms.term_months,
            });
        }
        Ok(schedule.balance_after(months_paid))
    }

    /// Largest principal a monthly `installment` can service, with no deposit
    /// and a balloon of `balloon_percent` of that principal.
    ///
    /// Solves `P = I * (1 - v) / r + pct * P * v` for `P` where `v = (1 + r)^-n`,
    /// rounded down to the cent.
    ///
    /// # Errors
    ///
    /// Returns [`LoanError`] if the installment is not positive, the rate is
    /// negative, the term or balloon fall outside the product's bounds, or the
    /// principal exceeds the decimal range.
    pub fn max_principal_for_installment(
        &self,
        installment: Decimal,
        annual_rate: Decimal,
        term_months: i32,
        balloon_percent: Decimal,
    ) -> Result<Decimal, LoanError> {
        if installment <= Decimal::ZERO {
            return Err(LoanError::NonPositiveInstallment(installment));
        }
        if annual_rate < Decimal::ZERO {
            return Err(LoanError::NegativeRate(annual_rate));
        }
        let months = self.validate_term(term_months)?;
        self.validate_balloon_percent(balloon_percent)?;

        let monthly_rate = annual_rate / Decimal::from(12);
        let principal = if monthly_rate.is_zero() {
            installment
                .checked_mul(Decimal::from(months))
                .and_then(|paid| paid.checked_div(Decimal::ONE - balloon_percent))
        } else {
            let v = discount_factor(monthly_rate, months);
            let annuity_factor = (Decimal::ONE - v) / monthly_rate;
            installment
                .checked_mul(annuity_factor)
                .and_then(|present| present.checked_div(Decimal::ONE - balloon_percent * v))
        };

        principal.map(round_down).ok_or(LoanError::Overflow)
    }

    fn installment_for(financing: &Financing) -> Result<Decimal, LoanError> {
        let Financing {
            financed,
            balloon,
            monthly_rate,
            months,
        } = *financing;

        if monthly_rate.is_zero() {
            return Ok(round_half_up((financed - balloon) / Decimal::from(months)));
        }

        let v = discount_factor(monthly_rate, months);
        let installment = (financed - balloon * v)
            .checked_mul(monthly_rate)
            .and_then(|interest| interest.checked_div(Decimal::ONE - v))
            .ok_or(LoanError::Overflow)?;

        Ok(round_half_up(installment))
    }

    fn validate(
        &self,
        terms: &LoanTerms,
    ) -> Result<Financing, LoanError> {
        if terms.principal <= Decimal::ZERO {
            return Err(LoanError::NonPositivePrincipal(terms.principal));
        }
        if terms.annual_rate < Decimal::ZERO {
            return Err(LoanError::NegativeRate(terms.annual_rate));
        }
        let months = self.validate_term(terms.term_months)?;

        let deposit = terms.deposit();
        if deposit < Decimal::ZERO {
            return Err(LoanError::NegativeDeposit(deposit));
        }
        if deposit >= terms.principal {
            return Err(LoanError::DepositTooLarge {
                deposit,
                principal: terms.principal,
            });
        }

        let balloon_percent = terms.balloon_percent();
        self.validate_balloon_percent(balloon_percent)?;

        let financed = terms.principal - deposit;
        let balloon = round_half_up(balloon_percent * terms.principal);
        if balloon > Decimal::ZERO && balloon >= financed {
            return Err(LoanError::BalloonExceedsFinancedAmount { balloon, financed });
        }

        Ok(Financing {
            financed,
            balloon,
            monthly_rate: terms.annual_rate / Decimal::from(12),
            months,
        })
    }

    fn validate_term(
        &self,
        term_months: i32,
    ) -> Result<u32, LoanError> {
        let months = u32::try_from(term_months)
            .ok()
            .filter(|m| *m > 0)
            .ok_or(LoanError::NonPositiveTerm(term_months))?;

        if months < self.product.min_term_months || months > self.product.max_term_months {
            return Err(LoanError::TermOutOfRange {
                product: self.product.name.clone(),
                term: term_months,
                min: self.product.min_term_months,
                max: self.product.max_term_months,
            });
        }
        Ok(months)
    }

    fn validate_balloon_percent(
        &self,
        balloon_percent: Decimal,
    ) -> Result<(), LoanError> {
        if balloon_percent < Decimal::ZERO {
            return Err(LoanError::NegativeBalloon(balloon_percent));
        }
        if balloon_percent > self.product.max_balloon_percent {
            return Err(LoanError::BalloonTooLarge {
                product: self.product.name.clone(),
                requested: balloon_percent,
                max: self.product.max_balloon_percent,
            });
        }
        Ok(())
    }
}

impl Default for AmortizationEngine {
    fn default() -> Self {
        Self::new(LoanProduct::default())
    }
}
