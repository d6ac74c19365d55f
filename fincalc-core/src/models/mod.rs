mod deduction;
mod deposit;
mod loan;
mod rebate_table;
mod tax_bracket;
mod tax_result;

pub use deduction::{Deduction, DeductionRule};
pub use deposit::{CompoundingFrequency, DepositTerms, GrowthPeriod, GrowthResult};
pub use loan::{AmortizationPeriod, AmortizationSchedule, LoanProduct, LoanTerms};
pub use rebate_table::{AgeBand, RebateTable};
pub use tax_bracket::{TaxBracket, TaxTable};
pub use tax_result::TaxResult;
