//! Financial calculation engines.
//!
//! Each engine is a pure function of its inputs and the static configuration
//! it was built from: no I/O, no clock, no shared state.

pub mod amortization;
pub mod bracket_tax;
pub mod common;
pub mod compound_growth;

pub use amortization::{AmortizationEngine, LoanError};
pub use bracket_tax::{BracketTaxEvaluator, TaxError};
pub use compound_growth::{
    GrowthError, GrowthPeriodIter, GrowthPeriods, compute_growth, period_breakdown,
};
