use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// One marginal rate band. `max` of `None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        min: Decimal,
        max: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self { min, max, rate }
    }

    /// Whether `income` falls inside this band. The upper bound is inclusive.
    pub fn contains(
        &self,
        income: Decimal,
    ) -> bool {
        income >= self.min && self.max.is_none_or(|max| income <= max)
    }
}

/// A validated, ascending, contiguous set of [`TaxBracket`]s.
///
/// The only way to build one is [`TaxTable::new`], so holding a `TaxTable`
/// means the contiguity invariants have already been checked. The cumulative
/// tax due at the start of every band is precomputed for the closed-form path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxTable {
    brackets: Vec<TaxBracket>,
    base_tax: Vec<Decimal>,
}

impl TaxTable {
    /// Validates `brackets` and builds the table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if:
    /// - there are no brackets
    /// - the first bracket does not start at zero
    /// - a rate lies outside `[0, 1]`
    /// - a bracket is empty or inverted
    /// - two neighbouring brackets leave a gap or overlap
    /// - any bracket other than the last is unbounded
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, ConfigurationError> {
        let first = brackets.first().ok_or(ConfigurationError::NoBrackets)?;
        if !first.min.is_zero() {
            return Err(ConfigurationError::FirstBracketNotZero(first.min));
        }

        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(ConfigurationError::InvalidRate {
                    index,
                    rate: bracket.rate,
                });
            }
            if let Some(max) = bracket.max {
                if max <= bracket.min {
                    return Err(ConfigurationError::EmptyBracket {
                        index,
                        min: bracket.min,
                        max,
                    });
                }
            }
        }

        for (index, pair) in brackets.windows(2).enumerate() {
            let previous_max = pair[0]
                .max
                .ok_or(ConfigurationError::UnboundedNotLast(index))?;
            let next_min = pair[1].min;
            if next_min > previous_max {
                return Err(ConfigurationError::BracketGap {
                    index,
                    previous_max,
                    next_min,
                });
            }
            if next_min < previous_max {
                return Err(ConfigurationError::BracketOverlap {
                    index,
                    previous_max,
                    next_min,
                });
            }
        }

        let mut base_tax = Vec::with_capacity(brackets.len());
        let mut running = Decimal::ZERO;
        for bracket in &brackets {
            base_tax.push(running);
            if let Some(max) = bracket.max {
                running += (max - bracket.min) * bracket.rate;
            }
        }

        Ok(Self { brackets, base_tax })
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Cumulative tax due on all income below the start of bracket `index`.
    pub fn base_tax(
        &self,
        index: usize,
    ) -> Option<Decimal> {
        self.base_tax.get(index).copied()
    }

    /// Index of the bracket containing `income`.
    ///
    /// Boundaries belong to the lower bracket. Negative income maps to the
    /// first bracket.
    pub fn bracket_index(
        &self,
        income: Decimal,
    ) -> usize {
        self.brackets
            .iter()
            .position(|b| b.max.is_none_or(|max| income <= max))
            .unwrap_or(self.brackets.len() - 1)
    }

    /// The bracket containing `income`.
    pub fn bracket_for(
        &self,
        income: Decimal,
    ) -> &TaxBracket {
        &self.brackets[self.bracket_index(income)]
    }
}

impl<'de> Deserialize<'de> for TaxTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let brackets = Vec::<TaxBracket>::deserialize(deserializer)?;
        TaxTable::new(brackets).map_err(serde::de::Error::custom)
    }
}
