use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Output of the tax estimator. Values are unrounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxEstimate {
    pub total_income: Decimal,
    pub taxable_income: Decimal,
    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub total_tax: Decimal,
    pub estimated_refund: Decimal,

    /// Total tax divided by total income, as a fraction (0.15 = 15%).
    pub effective_rate: Decimal,
}

impl TaxEstimate {
    /// Effective rate expressed as a percentage.
    pub fn effective_rate_percent(&self) -> Decimal {
        self.effective_rate * Decimal::ONE_HUNDRED
    }
}
