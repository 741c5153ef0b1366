//! The in-memory filer record for one filing session.
//!
//! Every numeric field is kept non-negative: setters clamp negative values to
//! zero so the estimator never sees a negative income.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::FilingStatus;
use crate::calculations::common::clamp_non_negative;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    pub name: String,
    pub ssn: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    /// Canonical `XXX-XX-XXXX` form once fully entered.
    pub ssn: String,
    pub address: String,
    /// `None` until the filer picks a status.
    pub filing_status: Option<FilingStatus>,
    pub dependents: Vec<Dependent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeField {
    Wages,
    Form1099,
    Investment,
    StateSpecific,
}

impl IncomeField {
    pub fn all() -> &'static [IncomeField] {
        &[
            Self::Wages,
            Self::Form1099,
            Self::Investment,
            Self::StateSpecific,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Wages => "W-2 wages",
            Self::Form1099 => "1099 income",
            Self::Investment => "Investment income",
            Self::StateSpecific => "State-specific income",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wages" | "w2" => Some(Self::Wages),
            "1099" | "form1099" => Some(Self::Form1099),
            "investment" | "investments" => Some(Self::Investment),
            "state" | "state-specific" => Some(Self::StateSpecific),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Income {
    wages: Decimal,
    form_1099: Decimal,
    investment: Decimal,
    state_specific: Decimal,
}

impl Income {
    pub fn get(
        &self,
        field: IncomeField,
    ) -> Decimal {
        match field {
            IncomeField::Wages => self.wages,
            IncomeField::Form1099 => self.form_1099,
            IncomeField::Investment => self.investment,
            IncomeField::StateSpecific => self.state_specific,
        }
    }

    /// Stores `amount`, clamped to zero when negative.
    pub fn set(
        &mut self,
        field: IncomeField,
        amount: Decimal,
    ) {
        let slot = match field {
            IncomeField::Wages => &mut self.wages,
            IncomeField::Form1099 => &mut self.form_1099,
            IncomeField::Investment => &mut self.investment,
            IncomeField::StateSpecific => &mut self.state_specific,
        };
        *slot = clamp_non_negative(amount);
    }

    pub fn total(&self) -> Decimal {
        self.wages + self.form_1099 + self.investment + self.state_specific
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionMode {
    #[default]
    Standard,
    Itemized,
}

impl DeductionMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Itemized => "Itemized",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "itemized" => Some(Self::Itemized),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditField {
    ChildTax,
    Education,
}

impl CreditField {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ChildTax => "Child tax credit",
            Self::Education => "Education credit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "child" | "child-tax" => Some(Self::ChildTax),
            "education" => Some(Self::Education),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deductions {
    pub mode: DeductionMode,
    child_tax_credit: Decimal,
    education_credit: Decimal,
}

impl Deductions {
    pub fn credit(
        &self,
        field: CreditField,
    ) -> Decimal {
        match field {
            CreditField::ChildTax => self.child_tax_credit,
            CreditField::Education => self.education_credit,
        }
    }

    /// Stores `amount`, clamped to zero when negative.
    pub fn set_credit(
        &mut self,
        field: CreditField,
        amount: Decimal,
    ) {
        let slot = match field {
            CreditField::ChildTax => &mut self.child_tax_credit,
            CreditField::Education => &mut self.education_credit,
        };
        *slot = clamp_non_negative(amount);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Processing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub id: DocumentId,
    pub name: String,
    pub size_bytes: u64,
    pub status: ProcessingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMethod {
    KnowledgeBased,
    Document,
    ThirdParty,
}

impl VerificationMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::KnowledgeBased => "Knowledge-based questions",
            Self::Document => "ID document upload",
            Self::ThirdParty => "Third-party identity provider",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kba" | "knowledge" | "knowledge-based" => Some(Self::KnowledgeBased),
            "document" | "doc" => Some(Self::Document),
            "third-party" | "thirdparty" | "provider" => Some(Self::ThirdParty),
            _ => None,
        }
    }
}

/// Identity verification progress, tagged by the chosen method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationState {
    /// No method chosen yet.
    #[default]
    NotStarted,
    /// `answers[i]` records whether question `i` was answered correctly.
    KnowledgeBased { answers: Vec<bool> },
    Document { uploaded: bool },
    ThirdParty { started: bool },
    AwaitingCode { method: VerificationMethod },
    Verified { method: VerificationMethod },
}

impl VerificationState {
    pub fn method(&self) -> Option<VerificationMethod> {
        match self {
            Self::NotStarted => None,
            Self::KnowledgeBased { .. } => Some(VerificationMethod::KnowledgeBased),
            Self::Document { .. } => Some(VerificationMethod::Document),
            Self::ThirdParty { .. } => Some(VerificationMethod::ThirdParty),
            Self::AwaitingCode { method } | Self::Verified { method } => Some(*method),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// Everything the filer has entered during one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilerRecord {
    pub personal: PersonalInfo,
    pub income: Income,
    pub deductions: Deductions,
    pub documents: Vec<DocumentDescriptor>,
    pub verification: VerificationState,
    next_document_id: u64,
}

impl FilerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_income(&self) -> Decimal {
        self.income.total()
    }

    /// Registers an uploaded file in the `Processing` state.
    pub fn add_document(
        &mut self,
        name: impl Into<String>,
        size_bytes: u64,
    ) -> DocumentId {
        self.next_document_id += 1;
        let id = DocumentId(self.next_document_id);
        self.documents.push(DocumentDescriptor {
            id,
            name: name.into(),
            size_bytes,
            status: ProcessingStatus::Processing,
        });
        id
    }

    pub fn document(
        &self,
        id: DocumentId,
    ) -> Option<&DocumentDescriptor> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Flips one document to `Completed`. Returns `false` if it no longer exists.
    pub fn complete_document(
        &mut self,
        id: DocumentId,
    ) -> bool {
        match self.documents.iter_mut().find(|d| d.id == id) {
            Some(doc) => {
                doc.status = ProcessingStatus::Completed;
                true
            }
            None => false,
        }
    }

    pub fn remove_document(
        &mut self,
        id: DocumentId,
    ) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        self.documents.len() != before
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn new_record_is_empty() {
        let record = FilerRecord::new();

        assert_eq!(record.total_income(), dec!(0));
        assert!(record.personal.filing_status.is_none());
        assert!(record.documents.is_empty());
        assert_eq!(record.verification, VerificationState::NotStarted);
    }

    #[test]
    fn income_total_sums_all_four_fields() {
        let mut income = Income::default();
        income.set(IncomeField::Wages, dec!(60000));
        income.set(IncomeField::Form1099, dec!(8000));
        income.set(IncomeField::Investment, dec!(3000));
        income.set(IncomeField::StateSpecific, dec!(2000));

        assert_eq!(income.total(), dec!(73000));
    }

    #[test]
    fn negative_income_is_clamped_to_zero() {
        let mut income = Income::default();
        income.set(IncomeField::Investment, dec!(-250));

        assert_eq!(income.get(IncomeField::Investment), dec!(0));
    }

    #[test]
    fn negative_credit_is_clamped_to_zero() {
        let mut deductions = Deductions::default();
        deductions.set_credit(CreditField::Education, dec!(-1));
        deductions.set_credit(CreditField::ChildTax, dec!(2000));

        assert_eq!(deductions.credit(CreditField::Education), dec!(0));
        assert_eq!(deductions.credit(CreditField::ChildTax), dec!(2000));
    }

    #[test]
    fn documents_get_distinct_ids_and_complete_independently() {
        let mut record = FilerRecord::new();
        let w2 = record.add_document("w2.pdf", 2048);
        let form_1099 = record.add_document("1099.pdf", 1024);

        assert_ne!(w2, form_1099);
        assert!(record.complete_document(form_1099));

        assert_eq!(record.document(w2).map(|d| d.status), Some(ProcessingStatus::Processing));
        assert_eq!(
            record.document(form_1099).map(|d| d.status),
            Some(ProcessingStatus::Completed)
        );
    }

    #[test]
    fn completing_a_removed_document_is_a_no_op() {
        let mut record = FilerRecord::new();
        let id = record.add_document("w2.pdf", 2048);

        assert!(record.remove_document(id));
        assert!(!record.complete_document(id));
        assert!(!record.remove_document(id));
    }

    #[test]
    fn verification_method_follows_state() {
        assert_eq!(VerificationState::NotStarted.method(), None);
        assert_eq!(
            VerificationState::Document { uploaded: false }.method(),
            Some(VerificationMethod::Document)
        );
        assert!(
            VerificationState::Verified {
                method: VerificationMethod::ThirdParty
            }
            .is_verified()
        );
    }

    #[test]
    fn field_names_parse() {
        assert_eq!(IncomeField::parse("1099"), Some(IncomeField::Form1099));
        assert_eq!(DeductionMode::parse("Itemized"), Some(DeductionMode::Itemized));
        assert_eq!(CreditField::parse("child"), Some(CreditField::ChildTax));
        assert_eq!(VerificationMethod::parse("kba"), Some(VerificationMethod::KnowledgeBased));
    }
}
