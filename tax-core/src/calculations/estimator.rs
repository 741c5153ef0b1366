//! Tax liability estimation for the filing wizard.
//!
//! # Calculation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Standard deduction (flat, regardless of filing status or mode) |
//! | 2    | Taxable income: total income − deduction, minimum 0 |
//! | 3    | Federal tax from the marginal bracket schedule |
//! | 4    | State tax: taxable income × flat state rate |
//! | 5    | Total tax: federal + state |
//! | 6    | Estimated refund: total income × assumed withholding rate − total tax, minimum 0 |
//! | 7    | Effective rate: total tax ÷ total income (0 when income is 0) |
//!
//! No rounding is applied at any step.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::{DeductionMode, EstimatorConfig, TaxEstimator};
//!
//! let estimator = TaxEstimator::new(EstimatorConfig::default()).unwrap();
//! let estimate = estimator.estimate(dec!(73000), DeductionMode::Standard);
//!
//! assert_eq!(estimate.taxable_income, dec!(59150));
//! assert_eq!(estimate.federal_tax, dec!(8320.50));
//! assert_eq!(estimate.state_tax, dec!(2957.50));
//! assert_eq!(estimate.total_tax, dec!(11278.00));
//! assert_eq!(estimate.estimated_refund, dec!(1862.00));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::{clamp_non_negative, max};
use crate::{DeductionMode, EstimatorConfig, EstimatorConfigError, FilerRecord, TaxEstimate};

/// Calculator for the wizard's tax estimate.
///
/// The configuration is validated once in [`TaxEstimator::new`]; after that
/// [`TaxEstimator::estimate`] is total over non-negative income.
#[derive(Debug, Clone)]
pub struct TaxEstimator {
    config: EstimatorConfig,
}

impl Default for TaxEstimator {
    fn default() -> Self {
        Self {
            config: EstimatorConfig::default(),
        }
    }
}

impl TaxEstimator {
    /// Creates an estimator, rejecting bracket schedules with gaps or bad rates.
    pub fn new(config: EstimatorConfig) -> Result<Self, EstimatorConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimates tax for `total_income`.
    ///
    /// Negative income is treated as zero. `mode` is accepted for the
    /// itemized path, which currently uses the same flat deduction.
    pub fn estimate(
        &self,
        total_income: Decimal,
        mode: DeductionMode,
    ) -> TaxEstimate {
        let total_income = clamp_non_negative(total_income);
        let deduction = self.deduction(mode);
        let taxable_income = self.taxable_income(total_income, deduction);
        let federal_tax = self.federal_tax(taxable_income);
        let state_tax = self.state_tax(taxable_income);
        let total_tax = federal_tax + state_tax;
        let estimated_refund = self.estimated_refund(total_income, total_tax);
        let effective_rate = self.effective_rate(total_income, total_tax);

        debug!(
            %total_income,
            %taxable_income,
            %federal_tax,
            %state_tax,
            %estimated_refund,
            "tax estimate calculated"
        );

        TaxEstimate {
            total_income,
            taxable_income,
            federal_tax,
            state_tax,
            total_tax,
            estimated_refund,
            effective_rate,
        }
    }

    /// Estimates tax for everything entered on `record`.
    pub fn estimate_record(
        &self,
        record: &FilerRecord,
    ) -> TaxEstimate {
        self.estimate(record.total_income(), record.deductions.mode)
    }

    fn deduction(
        &self,
        _mode: DeductionMode,
    ) -> Decimal {
        self.config.standard_deduction
    }

    fn taxable_income(
        &self,
        total_income: Decimal,
        deduction: Decimal,
    ) -> Decimal {
        max(total_income - deduction, Decimal::ZERO)
    }

    fn federal_tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        if taxable_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        // Brackets cover (0, ∞) once validated, so the fallback is unreachable.
        self.config
            .brackets
            .iter()
            .find(|b| b.contains(taxable_income))
            .or_else(|| self.config.brackets.last())
            .map_or(Decimal::ZERO, |b| b.tax_on(taxable_income))
    }

    fn state_tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        taxable_income * self.config.state_rate
    }

    fn estimated_refund(
        &self,
        total_income: Decimal,
        total_tax: Decimal,
    ) -> Decimal {
        max(
            total_income * self.config.assumed_withholding_rate - total_tax,
            Decimal::ZERO,
        )
    }

    fn effective_rate(
        &self,
        total_income: Decimal,
        total_tax: Decimal,
    ) -> Decimal {
        if total_income.is_zero() {
            return Decimal::ZERO;
        }
        total_tax / total_income
    }
}
