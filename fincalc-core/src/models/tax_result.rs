use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of a bracket tax evaluation. Recomputed on every input change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    pub taxable_income: Decimal,
    pub total_deductions: Decimal,
    pub gross_tax: Decimal,
    pub rebate: Decimal,
    pub net_tax: Decimal,
    /// `net_tax / gross_income`, or zero for zero income.
    pub effective_rate: Decimal,
    /// Rate of the bracket containing the taxable income.
    pub marginal_rate: Decimal,
    pub net_income: Decimal,
    /// Net tax spread evenly over twelve months (PAYE).
    pub monthly_tax: Decimal,
}
