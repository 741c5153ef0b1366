//! Text rendering of the wizard screens.
//!
//! Rendering is a pure function of the session: nothing here mutates state.

use std::fmt::Write;

use rust_decimal::Decimal;
use tax_core::{
    CreditField, IncomeField, ProcessingStatus, VerificationMethod, VerificationState,
    round_whole,
};

use crate::payment::refund_timeline;
use crate::session::{SubmissionStatus, WizardSession};
use crate::step::Step;
use crate::utils::mask_ssn;
use crate::verification::{QUESTION_BANK, current_question};

/// Formats an amount as whole dollars with thousands separators (`$73,000`).
pub fn format_currency(amount: Decimal) -> String {
    let rounded = round_whole(amount);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn progress_bar(current: Step) -> String {
    Step::ALL
        .iter()
        .map(|step| {
            if *step == current {
                format!("[{}. {}]", step.number(), step.title())
            } else {
                format!(" {}. {} ", step.number(), step.title())
            }
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Renders the current screen.
pub fn render(session: &WizardSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", progress_bar(session.step()));
    let _ = writeln!(out);
    let body = match session.step() {
        Step::Registration => registration(session),
        Step::DataCollection => data_collection(session),
        Step::DocumentUpload => documents(session),
        Step::TaxCalculation => calculation(session),
        Step::ReviewSubmission => review(session),
        Step::PaymentRefunds => payment(session),
        Step::Notifications => notifications(session),
        Step::Complete => complete(session),
    };
    out.push_str(&body);
    let _ = writeln!(
        out,
        "\n{}",
        if session.can_continue() {
            "[next] Continue   [back] Back"
        } else {
            "(complete this step to continue)   [back] Back"
        }
    );
    out
}

fn registration(session: &WizardSession) -> String {
    let form = session.registration();
    let mut out = String::from("User Registration & Authentication\n");
    let field = |out: &mut String, name: &str, label: &str, value: &str| {
        let _ = writeln!(out, "  {label:<10} {value}");
        if let Some(err) = session.field_errors().iter().find(|e| e.field == name) {
            let _ = writeln!(out, "             ! {}", err.message);
        }
    };
    field(&mut out, "email", "Email", &form.email);
    field(&mut out, "password", "Password", &"*".repeat(form.password.chars().count()));
    field(&mut out, "phone", "Phone", &form.phone);
    field(&mut out, "ssn", "SSN", &form.ssn);

    let _ = writeln!(out, "\nIdentity verification");
    if let Some(err) = session.verification_error() {
        let _ = writeln!(out, "  ! {err}");
    }
    match &session.record().verification {
        VerificationState::NotStarted => {
            let _ = writeln!(out, "  Choose a method: verify kba | verify document | verify third-party");
        }
        state @ VerificationState::KnowledgeBased { .. } => {
            if let Some((index, question)) = current_question(state) {
                let _ = writeln!(
                    out,
                    "  Question {} of {}: {}",
                    index + 1,
                    QUESTION_BANK.len(),
                    question.prompt
                );
                for (i, choice) in question.choices.iter().enumerate() {
                    let _ = writeln!(out, "    {}) {choice}", i + 1);
                }
            }
        }
        VerificationState::Document { uploaded: false } => {
            let _ = writeln!(out, "  Upload a photo of your ID: upload-id");
        }
        VerificationState::Document { uploaded: true } => {
            let _ = writeln!(out, "  Verifying your ID document...");
        }
        VerificationState::ThirdParty { started: false } => {
            let _ = writeln!(out, "  Connect to the identity provider: start-check");
        }
        VerificationState::ThirdParty { started: true } => {
            let _ = writeln!(out, "  Waiting for the identity provider...");
        }
        VerificationState::AwaitingCode { method } => {
            let _ = writeln!(
                out,
                "  {} complete. Enter the 6-digit code sent to {}: code <digits>",
                method.label(),
                if form.phone.is_empty() { "your phone" } else { form.phone.as_str() }
            );
        }
        VerificationState::Verified { method } => {
            let _ = writeln!(out, "  Verified ({})", verified_label(*method));
        }
    }
    out
}

fn verified_label(method: VerificationMethod) -> &'static str {
    match method {
        VerificationMethod::KnowledgeBased => "identity questions",
        VerificationMethod::Document => "ID document",
        VerificationMethod::ThirdParty => "identity provider",
    }
}

fn data_collection(session: &WizardSession) -> String {
    let record = session.record();
    let personal = &record.personal;
    let mut out = String::from("Personal Information\n");
    let _ = writeln!(out, "  SSN            {}", mask_ssn(&personal.ssn));
    let _ = writeln!(out, "  Address        {}", personal.address);
    let _ = writeln!(
        out,
        "  Filing status  {}",
        personal.filing_status.map_or("Not selected", |s| s.label())
    );
    let _ = writeln!(out, "  Dependents     {}", personal.dependents.len());
    for (i, dependent) in personal.dependents.iter().enumerate() {
        let _ = writeln!(
            out,
            "    {}) {} - {} ({})",
            i + 1,
            dependent.name,
            dependent.relationship,
            mask_ssn(&dependent.ssn)
        );
    }

    let _ = writeln!(out, "\nIncome");
    for field in IncomeField::all() {
        let _ = writeln!(
            out,
            "  {:<22} {}",
            field.label(),
            format_currency(record.income.get(*field))
        );
    }
    let _ = writeln!(out, "  {:<22} {}", "Total", format_currency(record.total_income()));

    let _ = writeln!(out, "\nDeductions & Credits");
    let _ = writeln!(out, "  Deduction              {}", record.deductions.mode.label());
    for field in [CreditField::ChildTax, CreditField::Education] {
        let _ = writeln!(
            out,
            "  {:<22} {}",
            field.label(),
            format_currency(record.deductions.credit(field))
        );
    }
    out
}

fn documents(session: &WizardSession) -> String {
    let mut out = String::from("Document Upload\n");
    let docs = &session.record().documents;
    if docs.is_empty() {
        let _ = writeln!(out, "  No documents yet: upload <name> <bytes> | import");
    }
    for doc in docs {
        let status = match doc.status {
            ProcessingStatus::Processing => "processing...",
            ProcessingStatus::Completed => "completed",
        };
        let _ = writeln!(
            out,
            "  {} {:<40} {:>8.1} KB  {status}",
            doc.id,
            doc.name,
            doc.size_bytes as f64 / 1024.0
        );
    }
    out
}

fn calculation(session: &WizardSession) -> String {
    let estimate = session.estimate();
    let mut out = String::from("Tax Calculation\n");
    let _ = writeln!(out, "  Total income        {}", format_currency(estimate.total_income));
    let _ = writeln!(out, "  Taxable income      {}", format_currency(estimate.taxable_income));
    let _ = writeln!(out, "  Federal tax         {}", format_currency(estimate.federal_tax));
    let _ = writeln!(out, "  State tax           {}", format_currency(estimate.state_tax));
    let _ = writeln!(out, "  Total tax           {}", format_currency(estimate.total_tax));
    let _ = writeln!(
        out,
        "  Estimated refund    {}",
        format_currency(estimate.estimated_refund)
    );
    let _ = writeln!(
        out,
        "  Effective rate      {}%",
        estimate.effective_rate_percent().round_dp(1)
    );
    out
}

fn review(session: &WizardSession) -> String {
    let record = session.record();
    let estimate = session.estimate();
    let mut out = String::from("Review & Submit\n");
    let _ = writeln!(out, "  Email          {}", session.registration().email);
    let _ = writeln!(
        out,
        "  Filing status  {}",
        record.personal.filing_status.map_or("Not selected", |s| s.label())
    );
    let _ = writeln!(out, "  Total income   {}", format_currency(estimate.total_income));
    let _ = writeln!(out, "  Total tax      {}", format_currency(estimate.total_tax));
    let _ = writeln!(out, "  Documents      {}", record.documents.len());
    let _ = writeln!(out);
    match session.submission() {
        SubmissionStatus::Ready => {
            let _ = writeln!(out, "  Ready to e-file: submit");
        }
        SubmissionStatus::Submitting => {
            let _ = writeln!(out, "  Submitting to IRS and state...");
        }
        SubmissionStatus::Submitted {
            confirmation,
            submitted_on,
        } => {
            let _ = writeln!(out, "  Submitted {submitted_on}. Confirmation: {confirmation}");
        }
    }
    let _ = writeln!(out, "  Download a copy: download <label>");
    out
}

fn payment(session: &WizardSession) -> String {
    let estimate = session.estimate();
    let mut out = String::from("Payment & Refunds\n");
    if estimate.estimated_refund > Decimal::ZERO {
        let _ = writeln!(
            out,
            "  Estimated refund {}",
            format_currency(estimate.estimated_refund)
        );
    } else {
        let _ = writeln!(out, "  No refund expected");
    }
    match session.refund_method() {
        Some(method) => {
            let _ = writeln!(out, "  Refund method: {}", method.describe());
        }
        None => {
            let _ = writeln!(out, "  Choose: refund deposit <routing> <account> | refund check");
        }
    }
    let _ = writeln!(out, "\n  Refund tracking");
    for entry in refund_timeline(session.submission().submitted_on()) {
        let _ = writeln!(
            out,
            "   {} {:<16} {}",
            if entry.reached { "[x]" } else { "[ ]" },
            entry.stage.label(),
            entry
                .expected_on
                .map_or_else(|| "after submission".to_string(), |d| d.to_string())
        );
    }
    out
}

fn notifications(session: &WizardSession) -> String {
    let prefs = session.notifications();
    let on_off = |enabled: bool| if enabled { "on" } else { "off" };
    let mut out = String::from("Notifications\n");
    let _ = writeln!(out, "  Email updates       {}", on_off(prefs.email));
    let _ = writeln!(out, "  SMS updates         {}", on_off(prefs.sms));
    let _ = writeln!(out, "  Next-season reminder {}", on_off(prefs.reminders));
    let _ = writeln!(out, "  Change: notify <email|sms|reminders> <on|off>");
    out
}

fn complete(session: &WizardSession) -> String {
    let mut out = String::from("Filing Complete\n");
    match session.submission() {
        SubmissionStatus::Submitted { confirmation, .. } => {
            let _ = writeln!(out, "  Your return was filed. Confirmation: {confirmation}");
        }
        SubmissionStatus::Submitting => {
            let _ = writeln!(out, "  Your return is still being submitted.");
        }
        SubmissionStatus::Ready => {
            let _ = writeln!(out, "  Your return has not been submitted.");
        }
    }
    let _ = writeln!(out, "  Start another return: new");
    out
}
