use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed static configuration: bracket tables, rebate tables, deduction
/// rules or loan products.
///
/// These indicate a data error rather than a user error. Loaders surface them
/// at startup and callers are expected to treat them as fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("tax table has no brackets")]
    NoBrackets,

    #[error("first bracket must start at 0, got {0}")]
    FirstBracketNotZero(Decimal),

    #[error("bracket {index} has rate {rate}, expected a fraction between 0 and 1")]
    InvalidRate { index: usize, rate: Decimal },

    #[error("bracket {index} is empty or inverted: min {min}, max {max}")]
    EmptyBracket {
        index: usize,
        min: Decimal,
        max: Decimal,
    },

    #[error("gap between bracket {index} (max {previous_max}) and the next (min {next_min})")]
    BracketGap {
        index: usize,
        previous_max: Decimal,
        next_min: Decimal,
    },

    #[error("bracket {index} (max {previous_max}) overlaps the next (min {next_min})")]
    BracketOverlap {
        index: usize,
        previous_max: Decimal,
        next_min: Decimal,
    },

    #[error("only the final bracket may be unbounded, bracket {0} is not final")]
    UnboundedNotLast(usize),

    #[error("rebate for {band} must be non-negative, got {amount}")]
    NegativeRebate { band: String, amount: Decimal },

    #[error("deduction rule '{name}': {reason}")]
    InvalidDeductionRule { name: String, reason: String },

    #[error("loan product '{name}': {reason}")]
    InvalidLoanProduct { name: String, reason: String },
}
