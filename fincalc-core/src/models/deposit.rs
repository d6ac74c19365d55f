use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How often interest is capitalised within a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompoundingFrequency {
    Daily,
    #[default]
    Monthly,
    Quarterly,
    SemiAnnually,
    Annually,
}

impl CompoundingFrequency {
    /// Compounding periods per year.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Self::Daily => 365,
            Self::Monthly => 12,
            Self::Quarterly => 4,
            Self::SemiAnnually => 2,
            Self::Annually => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::SemiAnnually => "semi_annually",
            Self::Annually => "annually",
        }
    }
}

impl fmt::Display for CompoundingFrequency {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompoundingFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "365" => Ok(Self::Daily),
            "monthly" | "12" => Ok(Self::Monthly),
            "quarterly" | "4" => Ok(Self::Quarterly),
            "semi_annually" | "semi-annually" | "semiannually" | "2" => Ok(Self::SemiAnnually),
            "annually" | "yearly" | "1" => Ok(Self::Annually),
            other => Err(format!("unknown compounding frequency '{other}'")),
        }
    }
}

/// Inputs for a fixed deposit or savings projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositTerms {
    pub principal: Decimal,
    /// Nominal annual rate as a fraction. May be negative.
    pub annual_rate: Decimal,
    #[serde(default)]
    pub compounding: CompoundingFrequency,
    pub term_months: i32,
    #[serde(default)]
    pub monthly_contribution: Option<Decimal>,
    /// Interest exempt from tax (e.g. an annual interest exemption).
    #[serde(default)]
    pub interest_exemption: Option<Decimal>,
}

impl DepositTerms {
    pub fn new(
        principal: Decimal,
        annual_rate: Decimal,
        compounding: CompoundingFrequency,
        term_months: i32,
    ) -> Self {
        Self {
            principal,
            annual_rate,
            compounding,
            term_months,
            monthly_contribution: None,
            interest_exemption: None,
        }
    }

    pub fn with_contribution(
        mut self,
        monthly_contribution: Decimal,
    ) -> Self {
        self.monthly_contribution = Some(monthly_contribution);
        self
    }

    pub fn with_exemption(
        mut self,
        interest_exemption: Decimal,
    ) -> Self {
        self.interest_exemption = Some(interest_exemption);
        self
    }
}

/// Balance movement over one compounding period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthPeriod {
    pub period: u32,
    pub opening_balance: Decimal,
    pub interest: Decimal,
    pub contribution: Decimal,
    pub closing_balance: Decimal,
}

/// Terminal figures of a deposit projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthResult {
    pub terminal_value: Decimal,
    pub total_contributions: Decimal,
    pub total_interest: Decimal,
    /// Interest above the exemption. Taxing it is the tax evaluator's job.
    pub taxable_interest: Decimal,
    pub periods: u32,
}
