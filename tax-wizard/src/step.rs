//! The ordered list of wizard screens and the transitions between them.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    #[default]
    Registration,
    DataCollection,
    DocumentUpload,
    TaxCalculation,
    ReviewSubmission,
    PaymentRefunds,
    Notifications,
    Complete,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::Registration,
        Step::DataCollection,
        Step::DocumentUpload,
        Step::TaxCalculation,
        Step::ReviewSubmission,
        Step::PaymentRefunds,
        Step::Notifications,
        Step::Complete,
    ];

    /// Forward transition. `Complete` has none; leaving it is a reset.
    pub fn next(self) -> Option<Step> {
        match self {
            Step::Registration => Some(Step::DataCollection),
            Step::DataCollection => Some(Step::DocumentUpload),
            Step::DocumentUpload => Some(Step::TaxCalculation),
            Step::TaxCalculation => Some(Step::ReviewSubmission),
            Step::ReviewSubmission => Some(Step::PaymentRefunds),
            Step::PaymentRefunds => Some(Step::Notifications),
            Step::Notifications => Some(Step::Complete),
            Step::Complete => None,
        }
    }

    pub fn previous(self) -> Option<Step> {
        match self {
            Step::Registration => None,
            Step::DataCollection => Some(Step::Registration),
            Step::DocumentUpload => Some(Step::DataCollection),
            Step::TaxCalculation => Some(Step::DocumentUpload),
            Step::ReviewSubmission => Some(Step::TaxCalculation),
            Step::PaymentRefunds => Some(Step::ReviewSubmission),
            Step::Notifications => Some(Step::PaymentRefunds),
            Step::Complete => Some(Step::Notifications),
        }
    }

    /// 1-based position shown in the progress bar.
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).map_or(0, |i| i + 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Registration => "Registration",
            Step::DataCollection => "Data Collection",
            Step::DocumentUpload => "Documents",
            Step::TaxCalculation => "Calculations",
            Step::ReviewSubmission => "Review",
            Step::PaymentRefunds => "Payment",
            Step::Notifications => "Notifications",
            Step::Complete => "Complete",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.title())
    }
}
