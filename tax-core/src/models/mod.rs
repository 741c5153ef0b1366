mod filer;
mod filing_status;
mod tax_bracket;
mod tax_estimate;
mod tax_year_config;

pub use filer::{
    DeductionMode, Deductions, Dependent, DocumentDescriptor, DocumentId, FilerRecord, Income,
    IncomeField, CreditField, PersonalInfo, ProcessingStatus, VerificationMethod,
    VerificationState,
};
pub use filing_status::FilingStatus;
pub use tax_bracket::TaxBracket;
pub use tax_estimate::TaxEstimate;
pub use tax_year_config::{EstimatorConfig, EstimatorConfigError};
