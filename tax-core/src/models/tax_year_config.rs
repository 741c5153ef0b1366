use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TaxBracket;

/// Errors raised when an [`EstimatorConfig`] is internally inconsistent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimatorConfigError {
    #[error("no tax brackets provided")]
    NoTaxBrackets,

    #[error("first tax bracket must start at 0, got {0}")]
    FirstBracketNotZero(Decimal),

    #[error("tax bracket {index} starts at {found} but the previous one ends at {expected}")]
    NonContiguousBrackets {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("only the last tax bracket may be open-ended (bracket {0})")]
    OpenBracketNotLast(usize),

    #[error("last tax bracket must be open-ended")]
    LastBracketBounded,

    #[error("tax rate must be between 0 and 1, got {0}")]
    InvalidRate(Decimal),

    #[error("standard deduction must be non-negative, got {0}")]
    NegativeStandardDeduction(Decimal),
}

/// Constants used by the tax estimator.
///
/// The defaults are the flat single-filer values used for every return:
/// a 13,850 standard deduction, four federal brackets, a 5% state rate and
/// an assumed withholding of 18% of gross income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub standard_deduction: Decimal,
    pub state_rate: Decimal,
    pub assumed_withholding_rate: Decimal,
    pub brackets: Vec<TaxBracket>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            standard_deduction: dec!(13850),
            state_rate: dec!(0.05),
            assumed_withholding_rate: dec!(0.18),
            brackets: default_brackets(),
        }
    }
}

fn default_brackets() -> Vec<TaxBracket> {
    vec![
        TaxBracket {
            min_income: dec!(0),
            max_income: Some(dec!(11000)),
            tax_rate: dec!(0.10),
            base_tax: dec!(0),
        },
        TaxBracket {
            min_income: dec!(11000),
            max_income: Some(dec!(44725)),
            tax_rate: dec!(0.12),
            base_tax: dec!(1100),
        },
        TaxBracket {
            min_income: dec!(44725),
            max_income: Some(dec!(95375)),
            tax_rate: dec!(0.22),
            base_tax: dec!(5147),
        },
        TaxBracket {
            min_income: dec!(95375),
            max_income: None,
            tax_rate: dec!(0.24),
            base_tax: dec!(16290),
        },
    ]
}

impl EstimatorConfig {
    /// Checks that the brackets cover `[0, ∞)` without gaps and that every
    /// rate is a fraction.
    pub fn validate(&self) -> Result<(), EstimatorConfigError> {
        if self.standard_deduction < Decimal::ZERO {
            return Err(EstimatorConfigError::NegativeStandardDeduction(
                self.standard_deduction,
            ));
        }
        for rate in [self.state_rate, self.assumed_withholding_rate] {
            check_rate(rate)?;
        }

        let first = self
            .brackets
            .first()
            .ok_or(EstimatorConfigError::NoTaxBrackets)?;
        if first.min_income != Decimal::ZERO {
            return Err(EstimatorConfigError::FirstBracketNotZero(first.min_income));
        }

        let last_index = self.brackets.len() - 1;
        for (index, bracket) in self.brackets.iter().enumerate() {
            check_rate(bracket.tax_rate)?;
            match bracket.max_income {
                None if index != last_index => {
                    return Err(EstimatorConfigError::OpenBracketNotLast(index));
                }
                Some(_) if index == last_index => {
                    return Err(EstimatorConfigError::LastBracketBounded);
                }
                _ => {}
            }
            if let Some(next) = self.brackets.get(index + 1) {
                let expected = bracket.max_income.unwrap_or(Decimal::MAX);
                if next.min_income != expected {
                    return Err(EstimatorConfigError::NonContiguousBrackets {
                        index: index + 1,
                        expected,
                        found: next.min_income,
                    });
                }
            }
        }

        Ok(())
    }
}

fn check_rate(rate: Decimal) -> Result<(), EstimatorConfigError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(EstimatorConfigError::InvalidRate(rate));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(EstimatorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn empty_brackets_are_rejected() {
        let config = EstimatorConfig {
            brackets: Vec::new(),
            ..Default::default()
        };

        assert_eq!(config.validate(), Err(EstimatorConfigError::NoTaxBrackets));
    }

    #[test]
    fn gap_between_brackets_is_rejected() {
        let mut config = EstimatorConfig::default();
        config.brackets[2].min_income = dec!(45000);

        assert_eq!(
            config.validate(),
            Err(EstimatorConfigError::NonContiguousBrackets {
                index: 2,
                expected: dec!(44725),
                found: dec!(45000),
            })
        );
    }

    #[test]
    fn bounded_top_bracket_is_rejected() {
        let mut config = EstimatorConfig::default();
        config.brackets[3].max_income = Some(dec!(500000));

        assert_eq!(config.validate(), Err(EstimatorConfigError::LastBracketBounded));
    }

    #[test]
    fn open_bracket_in_the_middle_is_rejected() {
        let mut config = EstimatorConfig::default();
        config.brackets[1].max_income = None;

        assert_eq!(config.validate(), Err(EstimatorConfigError::OpenBracketNotLast(1)));
    }

    #[test]
    fn rate_above_one_is_rejected() {
        let config = EstimatorConfig {
            state_rate: dec!(1.5),
            ..Default::default()
        };

        assert_eq!(config.validate(), Err(EstimatorConfigError::InvalidRate(dec!(1.5))));
    }

    #[test]
    fn negative_standard_deduction_is_rejected() {
        let config = EstimatorConfig {
            standard_deduction: dec!(-1),
            ..Default::default()
        };

        assert_eq!(
            config.validate(),
            Err(EstimatorConfigError::NegativeStandardDeduction(dec!(-1)))
        );
    }

    #[test]
    fn first_bracket_must_start_at_zero() {
        let mut config = EstimatorConfig::default();
        config.brackets[0].min_income = dec!(100);

        assert_eq!(
            config.validate(),
            Err(EstimatorConfigError::FirstBracketNotZero(dec!(100)))
        );
    }
}
