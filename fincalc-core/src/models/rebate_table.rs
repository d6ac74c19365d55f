use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Age category used to select a rebate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBand {
    #[serde(rename = "under_65")]
    Under65,
    #[serde(rename = "65_to_74")]
    From65To74,
    #[serde(rename = "75_plus")]
    Over75,
}

impl AgeBand {
    pub fn all() -> &'static [AgeBand] {
        &[AgeBand::Under65, AgeBand::From65To74, AgeBand::Over75]
    }

    pub fn for_age(age: u32) -> Self {
        match age {
            0..=64 => Self::Under65,
            65..=74 => Self::From65To74,
            _ => Self::Over75,
        }
    }

    /// Age band of someone born on `birth_date`, assessed on `as_of`.
    ///
    /// Tax calculators assess age on the last day of the tax year, which the
    /// caller supplies; nothing here reads the clock. A birth date after
    /// `as_of` is treated as age zero.
    pub fn on(
        birth_date: NaiveDate,
        as_of: NaiveDate,
    ) -> Self {
        Self::for_age(age_on(birth_date, as_of))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Under65 => "under_65",
            Self::From65To74 => "65_to_74",
            Self::Over75 => "75_plus",
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "under_65" | "under65" | "under-65" | "<65" => Ok(Self::Under65),
            "65_to_74" | "65-74" | "65to74" => Ok(Self::From65To74),
            "75_plus" | "75+" | "75plus" => Ok(Self::Over75),
            other => Err(format!(
                "unknown age band '{other}', expected one of under65, 65-74, 75+"
            )),
        }
    }
}

/// Completed years between `birth_date` and `as_of`.
fn age_on(
    birth_date: NaiveDate,
    as_of: NaiveDate,
) -> u32 {
    if birth_date > as_of {
        return 0;
    }
    let mut years = as_of.year() - birth_date.year();
    if (as_of.month(), as_of.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

/// Flat rebate amounts per [`AgeBand`].
///
/// Each amount is the total rebate for that band, so a South African
/// taxpayer aged 70 gets the primary plus secondary rebate as one figure.
///
/// Built only through [`RebateTable::new`] (or a validating deserialize), so
/// every amount is known to be non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebateTable {
    under_65: Decimal,
    from_65_to_74: Decimal,
    from_75: Decimal,
}

impl RebateTable {
    /// Validates the three band amounts and builds the table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NegativeRebate`] for the first negative
    /// amount.
    pub fn new(
        under_65: Decimal,
        from_65_to_74: Decimal,
        from_75: Decimal,
    ) -> Result<Self, ConfigurationError> {
        let table = Self {
            under_65,
            from_65_to_74,
            from_75,
        };
        for band in AgeBand::all() {
            let amount = table.rebate(*band);
            if amount < Decimal::ZERO {
                return Err(ConfigurationError::NegativeRebate {
                    band: band.to_string(),
                    amount,
                });
            }
        }
        Ok(table)
    }

    /// A table with the same rebate for every age band.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn flat(amount: Decimal) -> Result<Self, ConfigurationError> {
        Self::new(amount, amount, amount)
    }

    /// A table with no rebates at all.
    pub fn none() -> Self {
        Self {
            under_65: Decimal::ZERO,
            from_65_to_74: Decimal::ZERO,
            from_75: Decimal::ZERO,
        }
    }

    pub fn rebate(
        &self,
        band: AgeBand,
    ) -> Decimal {
        match band {
            AgeBand::Under65 => self.under_65,
            AgeBand::From65To74 => self.from_65_to_74,
            AgeBand::Over75 => self.from_75,
        }
    }
}

impl Default for RebateTable {
    fn default() -> Self {
        Self::none()
    }
}

/// Rebate amounts as written in configuration, before validation.
#[derive(Deserialize)]
struct RebateAmounts {
    under_65: Decimal,
    from_65_to_74: Decimal,
    from_75: Decimal,
}

impl<'de> Deserialize<'de> for RebateTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RebateAmounts::deserialize(deserializer)?;
        RebateTable::new(raw.under_65, raw.from_65_to_74, raw.from_75)
            .map_err(serde::de::Error::custom)
    }
}
