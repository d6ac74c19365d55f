use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// A configured, capped pre-tax deduction such as a retirement contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRule {
    pub name: String,
    /// Cap as a fraction of gross income.
    #[serde(default)]
    pub percentage_cap: Option<Decimal>,
    /// Cap as an absolute currency amount.
    #[serde(default)]
    pub absolute_cap: Option<Decimal>,
}

impl DeductionRule {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidDeductionRule {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if let Some(pct) = self.percentage_cap {
            if pct < Decimal::ZERO || pct > Decimal::ONE {
                return Err(invalid("percentage cap must be between 0 and 1"));
            }
        }
        if let Some(cap) = self.absolute_cap {
            if cap < Decimal::ZERO {
                return Err(invalid("absolute cap must be non-negative"));
            }
        }
        Ok(())
    }

    /// A deduction of `requested` under this rule's caps.
    pub fn request(
        &self,
        requested: Decimal,
    ) -> Deduction {
        Deduction {
            name: self.name.clone(),
            requested,
            percentage_cap: self.percentage_cap,
            absolute_cap: self.absolute_cap,
        }
    }
}

/// A requested pre-tax deduction together with the caps that limit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub name: String,
    pub requested: Decimal,
    pub percentage_cap: Option<Decimal>,
    pub absolute_cap: Option<Decimal>,
}

impl Deduction {
    /// An uncapped deduction.
    pub fn uncapped(
        name: impl Into<String>,
        requested: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            requested,
            percentage_cap: None,
            absolute_cap: None,
        }
    }

    /// `min(requested, percentage_cap * gross_income, absolute_cap)`; absent caps
    /// do not constrain.
    pub fn effective(
        &self,
        gross_income: Decimal,
    ) -> Decimal {
        let mut amount = self.requested;
        if let Some(pct) = self.percentage_cap {
            amount = amount.min(pct * gross_income);
        }
        if let Some(cap) = self.absolute_cap {
            amount = amount.min(cap);
        }
        amount
    }
}
