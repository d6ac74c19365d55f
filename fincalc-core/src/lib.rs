pub mod calculations;
pub mod error;
pub mod models;

pub use calculations::{
    AmortizationEngine, BracketTaxEvaluator, GrowthError, LoanError, TaxError,
};
pub use error::ConfigurationError;
pub use models::*;
