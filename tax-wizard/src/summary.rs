//! Plain-text return summary offered as a download.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use tax_core::{
    CreditField, FilerRecord, IncomeField, ProcessingStatus, TaxEstimate, round_whole,
};
use tracing::info;

use crate::error::WizardError;
use crate::payment::RefundMethod;
use crate::session::{SubmissionStatus, WizardSession};
use crate::utils::mask_ssn;

/// `Tax_Return_<year>_<label>.txt`, with anything other than ASCII
/// alphanumerics, `-` and `_` in the label replaced by `_`.
pub fn summary_file_name(
    tax_year: i32,
    label: &str,
) -> String {
    let label: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let label = if label.is_empty() { "Summary".to_string() } else { label };
    format!("Tax_Return_{tax_year}_{label}.txt")
}

/// Borrowed view of everything printed in the summary.
#[derive(Debug, Clone)]
pub struct ReturnSummary<'a> {
    pub tax_year: i32,
    pub email: &'a str,
    pub record: &'a FilerRecord,
    pub estimate: TaxEstimate,
    pub submission: &'a SubmissionStatus,
    pub refund_method: Option<&'a RefundMethod>,
}

impl<'a> ReturnSummary<'a> {
    pub fn from_session(session: &'a WizardSession) -> Self {
        Self {
            tax_year: session.tax_year(),
            email: &session.registration().email,
            record: session.record(),
            estimate: session.estimate(),
            submission: session.submission(),
            refund_method: session.refund_method(),
        }
    }
}

impl fmt::Display for ReturnSummary<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let personal = &self.record.personal;
        writeln!(f, "{} TAX RETURN SUMMARY", self.tax_year)?;
        writeln!(f, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M"))?;
        writeln!(f)?;

        writeln!(f, "FILER")?;
        writeln!(f, "Email:            {}", self.email)?;
        writeln!(f, "SSN:              {}", mask_ssn(&personal.ssn))?;
        writeln!(f, "Address:          {}", personal.address)?;
        writeln!(
            f,
            "Filing status:    {}",
            personal.filing_status.map_or("Not selected", |s| s.label())
        )?;
        writeln!(f, "Dependents:       {}", personal.dependents.len())?;
        for dependent in &personal.dependents {
            writeln!(f, "  - {} ({})", dependent.name, dependent.relationship)?;
        }
        writeln!(f)?;

        writeln!(f, "INCOME")?;
        for field in IncomeField::all() {
            writeln!(
                f,
                "{:<22}{}",
                format!("{}:", field.label()),
                round_whole(self.record.income.get(*field))
            )?;
        }
        writeln!(f, "{:<22}{}", "Total income:", round_whole(self.estimate.total_income))?;
        writeln!(f)?;

        writeln!(f, "DEDUCTIONS & CREDITS")?;
        writeln!(f, "Deduction:        {}", self.record.deductions.mode.label())?;
        for field in [CreditField::ChildTax, CreditField::Education] {
            writeln!(
                f,
                "{:<18}{}",
                format!("{}:", field.label()),
                round_whole(self.record.deductions.credit(field))
            )?;
        }
        writeln!(f)?;

        writeln!(f, "ESTIMATE")?;
        writeln!(f, "Taxable income:   {}", round_whole(self.estimate.taxable_income))?;
        writeln!(f, "Federal tax:      {}", round_whole(self.estimate.federal_tax))?;
        writeln!(f, "State tax:        {}", round_whole(self.estimate.state_tax))?;
        writeln!(f, "Total tax:        {}", round_whole(self.estimate.total_tax))?;
        writeln!(f, "Estimated refund: {}", round_whole(self.estimate.estimated_refund))?;
        writeln!(
            f,
            "Effective rate:   {}%",
            self.estimate.effective_rate_percent().round_dp(1)
        )?;
        writeln!(f)?;

        writeln!(f, "DOCUMENTS")?;
        if self.record.documents.is_empty() {
            writeln!(f, "(none)")?;
        }
        for doc in &self.record.documents {
            let status = match doc.status {
                ProcessingStatus::Processing => "processing",
                ProcessingStatus::Completed => "completed",
            };
            writeln!(f, "{} {} ({} bytes, {status})", doc.id, doc.name, doc.size_bytes)?;
        }
        writeln!(f)?;

        writeln!(f, "FILING")?;
        match self.submission {
            SubmissionStatus::Submitted {
                confirmation,
                submitted_on,
            } => writeln!(f, "Submitted {submitted_on}, confirmation {confirmation}")?,
            other => writeln!(f, "Status: {}", other.label())?,
        }
        if let Some(method) = self.refund_method {
            writeln!(f, "Refund method: {}", method.describe())?;
        }
        Ok(())
    }
}

/// Writes `summary` to `dir` and returns the file's path.
pub fn write_summary(
    dir: &Path,
    tax_year: i32,
    label: &str,
    summary: &ReturnSummary<'_>,
) -> Result<PathBuf, WizardError> {
    let path = dir.join(summary_file_name(tax_year, label));
    fs::write(&path, summary.to_string()).map_err(|source| WizardError::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "summary written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::WizardConfig;

    #[test]
    fn file_name_follows_pattern() {
        assert_eq!(summary_file_name(2024, "Federal"), "Tax_Return_2024_Federal.txt");
    }

    #[test]
    fn file_name_label_is_sanitized() {
        assert_eq!(summary_file_name(2024, "../State Copy"), "Tax_Return_2024____State_Copy.txt");
        assert_eq!(summary_file_name(2024, "  "), "Tax_Return_2024_Summary.txt");
    }

    #[test]
    fn summary_is_written_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _events) = WizardSession::new(&WizardConfig::default()).unwrap();

        let path = session.download_summary_to(dir.path(), "Federal").unwrap();

        assert_eq!(path, dir.path().join("Tax_Return_2024_Federal.txt"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("2024 TAX RETURN SUMMARY"));
        assert!(text.contains("Total income:         0"));
        assert!(text.contains("Status: ready"));
    }

    #[test]
    fn write_into_missing_directory_is_an_io_error() {
        let (session, _events) = WizardSession::new(&WizardConfig::default()).unwrap();

        let result = session.download_summary_to(Path::new("/this/path/does/not/exist"), "Federal");

        assert!(matches!(result, Err(WizardError::Io { .. })));
    }
}
