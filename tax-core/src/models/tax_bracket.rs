use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One marginal bracket of the federal rate schedule.
///
/// Tax for income inside the bracket is
/// `base_tax + tax_rate * (income - min_income)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    /// `None` for the open-ended top bracket.
    pub max_income: Option<Decimal>,
    pub tax_rate: Decimal,
    pub base_tax: Decimal,
}

impl TaxBracket {
    /// Returns `true` when `income` falls in `(min_income, max_income]`.
    pub fn contains(
        &self,
        income: Decimal,
    ) -> bool {
        income > self.min_income && self.max_income.is_none_or(|max| income <= max)
    }

    /// Tax owed on `income` under this bracket's formula.
    pub fn tax_on(
        &self,
        income: Decimal,
    ) -> Decimal {
        self.base_tax + (income - self.min_income) * self.tax_rate
    }
}
