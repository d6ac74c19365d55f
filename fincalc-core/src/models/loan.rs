use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Bounds a lender places on a loan product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub name: String,
    pub min_term_months: u32,
    pub max_term_months: u32,
    /// Largest balloon allowed, as a fraction of the principal.
    #[serde(default)]
    pub max_balloon_percent: Decimal,
}

impl LoanProduct {
    /// Vehicle finance: 6 to 84 months, balloon up to 40%.
    pub fn vehicle_finance() -> Self {
        Self {
            name: "vehicle".to_string(),
            min_term_months: 6,
            max_term_months: 84,
            max_balloon_percent: dec!(0.40),
        }
    }

    /// Unsecured personal loan: 6 to 72 months, no balloon.
    pub fn personal_loan() -> Self {
        Self {
            name: "personal".to_string(),
            min_term_months: 6,
            max_term_months: 72,
            max_balloon_percent: Decimal::ZERO,
        }
    }

    /// Home loan: 12 to 360 months, no balloon.
    pub fn home_loan() -> Self {
        Self {
            name: "home".to_string(),
            min_term_months: 12,
            max_term_months: 360,
            max_balloon_percent: Decimal::ZERO,
        }
    }

    pub fn builtin() -> Vec<LoanProduct> {
        vec![Self::vehicle_finance(), Self::personal_loan(), Self::home_loan()]
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidLoanProduct {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.min_term_months == 0 {
            return Err(invalid("minimum term must be at least one month"));
        }
        if self.max_term_months < self.min_term_months {
            return Err(invalid("maximum term is below the minimum term"));
        }
        if self.max_balloon_percent < Decimal::ZERO || self.max_balloon_percent >= Decimal::ONE {
            return Err(invalid("maximum balloon must be in [0, 1)"));
        }
        Ok(())
    }
}

impl Default for LoanProduct {
    fn default() -> Self {
        Self::vehicle_finance()
    }
}

/// What the borrower asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Decimal,
    /// Nominal annual rate as a fraction.
    pub annual_rate: Decimal,
    pub term_months: i32,
    #[serde(default)]
    pub deposit: Option<Decimal>,
    /// Balloon as a fraction of the principal.
    #[serde(default)]
    pub balloon_percent: Option<Decimal>,
}

impl LoanTerms {
    pub fn new(
        principal: Decimal,
        annual_rate: Decimal,
        term_months: i32,
    ) -> Self {
        Self {
            principal,
            annual_rate,
            term_months,
            deposit: None,
            balloon_percent: None,
        }
    }

    pub fn with_deposit(
        mut self,
        deposit: Decimal,
    ) -> Self {
        self.deposit = Some(deposit);
        self
    }

    pub fn with_balloon(
        mut self,
        balloon_percent: Decimal,
    ) -> Self {
        self.balloon_percent = Some(balloon_percent);
        self
    }

    pub fn deposit(&self) -> Decimal {
        self.deposit.unwrap_or(Decimal::ZERO)
    }

    pub fn balloon_percent(&self) -> Decimal {
        self.balloon_percent.unwrap_or(Decimal::ZERO)
    }
}

/// One row of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationPeriod {
    pub period: u32,
    pub opening_balance: Decimal,
    pub interest: Decimal,
    pub principal_portion: Decimal,
    pub payment: Decimal,
    pub closing_balance: Decimal,
}

/// Full repayment schedule for a loan.
///
/// `closing_balance` of each period equals the next period's
/// `opening_balance`, and the last period closes on the balloon amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub financed_amount: Decimal,
    pub balloon: Decimal,
    /// The regular monthly installment. The final period may differ by the
    /// rounding correction.
    pub installment: Decimal,
    pub total_interest: Decimal,
    /// Every payment plus the balloon.
    pub total_paid: Decimal,
    pub periods: Vec<AmortizationPeriod>,
}

impl AmortizationSchedule {
    pub fn final_period(&self) -> Option<&AmortizationPeriod> {
        self.periods.last()
    }

    /// Outstanding balance after `months_paid` installments.
    pub fn balance_after(
        &self,
        months_paid: u32,
    ) -> Decimal {
        if months_paid == 0 {
            return self.financed_amount;
        }
        self.periods
            .get(months_paid as usize - 1)
            .or(self.periods.last())
            .map_or(self.financed_amount, |p| p.closing_balance)
    }
}
