//! The wizard controller.
//!
//! A [`WizardSession`] owns the filer record for one filing session together
//! with the current step and everything the screens need. All mutation goes
//! through [`WizardSession::dispatch`] or [`WizardSession::apply_event`];
//! rendering reads the session and never changes it.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tax_core::{
    CreditField, DeductionMode, Dependent, DocumentId, FilerRecord, FilingStatus, IncomeField,
    TaxEstimate, TaxEstimator, VerificationMethod,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, WizardConfig};
use crate::error::{FieldError, VerificationError, WizardError};
use crate::payment::{NotificationChannel, NotificationPreferences, RefundMethod};
use crate::step::Step;
use crate::summary::{self, ReturnSummary};
use crate::tasks::{TaskEvent, TaskHandle, TaskReport, TaskScheduler};
use crate::utils::{format_phone, format_ssn, parse_amount};
use crate::validation::RegistrationForm;
use crate::verification::{self, KbaProgress};

/// E-file submission progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    #[default]
    Ready,
    Submitting,
    Submitted {
        confirmation: String,
        submitted_on: NaiveDate,
    },
}

impl SubmissionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Submitting => "submitting",
            Self::Submitted { .. } => "submitted",
        }
    }

    pub fn submitted_on(&self) -> Option<NaiveDate> {
        match self {
            Self::Submitted { submitted_on, .. } => Some(*submitted_on),
            _ => None,
        }
    }
}

/// Everything a user can do on any screen.
///
/// Amounts arrive as the raw text typed by the user; the session parses and
/// clamps them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // registration
    SetEmail(String),
    SetPassword(String),
    SetPhone(String),
    SetSsn(String),
    ChooseVerification(VerificationMethod),
    /// Zero-based index into the current question's choices.
    AnswerQuestion(usize),
    UploadIdDocument,
    StartProviderCheck,
    ConfirmCode(String),
    RestartVerification,

    // data collection
    SetAddress(String),
    SetFilingStatus(Option<FilingStatus>),
    AddDependent(Dependent),
    RemoveDependent(usize),
    SetIncome(IncomeField, String),
    SetDeductionMode(DeductionMode),
    SetCredit(CreditField, String),

    // documents
    UploadDocument { name: String, size_bytes: u64 },
    ImportFromProvider,
    RemoveDocument(DocumentId),

    // review, payment, notifications
    Submit,
    SetRefundMethod(RefundMethod),
    SetNotification(NotificationChannel, bool),

    // navigation
    Continue,
    Back,
    StartNewReturn,
}

impl Action {
    /// Step the action belongs to; `None` for navigation.
    fn required_step(&self) -> Option<Step> {
        match self {
            Self::SetEmail(_)
            | Self::SetPassword(_)
            | Self::SetPhone(_)
            | Self::SetSsn(_)
            | Self::ChooseVerification(_)
            | Self::AnswerQuestion(_)
            | Self::UploadIdDocument
            | Self::StartProviderCheck
            | Self::ConfirmCode(_)
            | Self::RestartVerification => Some(Step::Registration),
            Self::SetAddress(_)
            | Self::SetFilingStatus(_)
            | Self::AddDependent(_)
            | Self::RemoveDependent(_)
            | Self::SetIncome(..)
            | Self::SetDeductionMode(_)
            | Self::SetCredit(..) => Some(Step::DataCollection),
            Self::UploadDocument { .. } | Self::ImportFromProvider | Self::RemoveDocument(_) => {
                Some(Step::DocumentUpload)
            }
            Self::Submit => Some(Step::ReviewSubmission),
            Self::SetRefundMethod(_) => Some(Step::PaymentRefunds),
            Self::SetNotification(..) => Some(Step::Notifications),
            Self::StartNewReturn => Some(Step::Complete),
            Self::Continue | Self::Back => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::SetEmail(_) => "editing email",
            Self::SetPassword(_) => "editing password",
            Self::SetPhone(_) => "editing phone",
            Self::SetSsn(_) => "editing SSN",
            Self::ChooseVerification(_) => "choosing a verification method",
            Self::AnswerQuestion(_) => "answering a question",
            Self::UploadIdDocument => "uploading an ID document",
            Self::StartProviderCheck => "starting the provider check",
            Self::ConfirmCode(_) => "confirming a code",
            Self::RestartVerification => "restarting verification",
            Self::SetAddress(_) => "editing address",
            Self::SetFilingStatus(_) => "choosing a filing status",
            Self::AddDependent(_) => "adding a dependent",
            Self::RemoveDependent(_) => "removing a dependent",
            Self::SetIncome(..) => "entering income",
            Self::SetDeductionMode(_) => "choosing a deduction",
            Self::SetCredit(..) => "entering a credit",
            Self::UploadDocument { .. } => "uploading a document",
            Self::ImportFromProvider => "importing from a provider",
            Self::RemoveDocument(_) => "removing a document",
            Self::Submit => "submitting",
            Self::SetRefundMethod(_) => "choosing a refund method",
            Self::SetNotification(..) => "changing notifications",
            Self::StartNewReturn => "starting a new return",
            Self::Continue => "continuing",
            Self::Back => "going back",
        }
    }
}

#[derive(Debug)]
pub struct WizardSession {
    step: Step,
    record: FilerRecord,
    registration: RegistrationForm,
    field_errors: Vec<FieldError>,
    verification_error: Option<VerificationError>,
    submission: SubmissionStatus,
    refund_method: Option<RefundMethod>,
    notifications: NotificationPreferences,
    estimator: TaxEstimator,
    scheduler: TaskScheduler,
    tasks: Vec<TaskHandle>,
    tax_year: i32,
    output_dir: PathBuf,
}

impl WizardSession {
    /// Builds a session from `config` and returns the receiver on which
    /// simulated task completions arrive.
    pub fn new(config: &WizardConfig) -> Result<(Self, UnboundedReceiver<TaskReport>), ConfigError> {
        let estimator = TaxEstimator::new(config.estimator.clone())?;
        let (scheduler, events) = TaskScheduler::new(config.task_delays());
        let session = Self {
            step: Step::Registration,
            record: FilerRecord::new(),
            registration: RegistrationForm::default(),
            field_errors: Vec::new(),
            verification_error: None,
            submission: SubmissionStatus::Ready,
            refund_method: None,
            notifications: NotificationPreferences::default(),
            estimator,
            scheduler,
            tasks: Vec::new(),
            tax_year: config.tax_year,
            output_dir: config.output_dir.clone(),
        };
        Ok((session, events))
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn record(&self) -> &FilerRecord {
        &self.record
    }

    pub fn registration(&self) -> &RegistrationForm {
        &self.registration
    }

    /// Errors from the last rejected Continue that have not been edited since.
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn verification_error(&self) -> Option<&VerificationError> {
        self.verification_error.as_ref()
    }

    pub fn submission(&self) -> &SubmissionStatus {
        &self.submission
    }

    pub fn refund_method(&self) -> Option<&RefundMethod> {
        self.refund_method.as_ref()
    }

    pub fn notifications(&self) -> NotificationPreferences {
        self.notifications
    }

    pub fn tax_year(&self) -> i32 {
        self.tax_year
    }

    /// Number of simulated tasks still running.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Current estimate for the record. Reads the record only.
    pub fn estimate(&self) -> TaxEstimate {
        self.estimator.estimate_record(&self.record)
    }

    /// Whether Continue is enabled on the current step.
    pub fn can_continue(&self) -> bool {
        match self.step {
            Step::Registration => {
                self.registration.validate().is_ok() && self.record.verification.is_verified()
            }
            _ => true,
        }
    }

    pub fn dispatch(
        &mut self,
        action: Action,
    ) -> Result<(), WizardError> {
        if let Some(expected) = action.required_step() {
            if expected != self.step {
                return Err(WizardError::WrongStep {
                    action: action.name(),
                    expected,
                    actual: self.step,
                });
            }
        }
        debug!(step = %self.step, action = action.name(), "dispatch");

        match action {
            Action::SetEmail(email) => {
                self.registration.email = email.trim().to_string();
                self.clear_field_error("email");
            }
            Action::SetPassword(password) => {
                self.registration.password = password;
                self.clear_field_error("password");
            }
            Action::SetPhone(phone) => {
                self.registration.phone = format_phone(&phone);
                self.clear_field_error("phone");
            }
            Action::SetSsn(ssn) => {
                let formatted = format_ssn(&ssn);
                self.registration.ssn = formatted.clone();
                self.record.personal.ssn = formatted;
                self.clear_field_error("ssn");
            }
            Action::ChooseVerification(method) => {
                verification::choose_method(&mut self.record.verification, method)?;
                self.verification_error = None;
            }
            Action::AnswerQuestion(choice) => self.answer_question(choice)?,
            Action::UploadIdDocument => {
                verification::mark_document_uploaded(&mut self.record.verification)?;
                let handle = self.scheduler.check_identity(VerificationMethod::Document);
                self.track(handle);
            }
            Action::StartProviderCheck => {
                verification::start_third_party(&mut self.record.verification)?;
                let handle = self.scheduler.check_identity(VerificationMethod::ThirdParty);
                self.track(handle);
            }
            Action::ConfirmCode(code) => {
                verification::confirm_code(&mut self.record.verification, &code)?;
            }
            Action::RestartVerification => {
                verification::restart(&mut self.record.verification);
                self.verification_error = None;
            }
            Action::SetAddress(address) => self.record.personal.address = address,
            Action::SetFilingStatus(status) => self.record.personal.filing_status = status,
            Action::AddDependent(dependent) => self.record.personal.dependents.push(dependent),
            Action::RemoveDependent(index) => {
                if index >= self.record.personal.dependents.len() {
                    return Err(WizardError::UnknownDependent(index));
                }
                self.record.personal.dependents.remove(index);
            }
            Action::SetIncome(field, raw) => self.record.income.set(field, parse_amount(&raw)),
            Action::SetDeductionMode(mode) => self.record.deductions.mode = mode,
            Action::SetCredit(field, raw) => {
                self.record.deductions.set_credit(field, parse_amount(&raw));
            }
            Action::UploadDocument { name, size_bytes } => self.upload(name, size_bytes),
            Action::ImportFromProvider => {
                self.upload("W-2 (imported from payroll provider).pdf".to_string(), 48_213);
            }
            Action::RemoveDocument(id) => {
                if !self.record.remove_document(id) {
                    return Err(WizardError::UnknownDocument(id));
                }
            }
            Action::Submit => self.submit()?,
            Action::SetRefundMethod(method) => self.refund_method = Some(method),
            Action::SetNotification(channel, enabled) => self.notifications.set(channel, enabled),
            Action::Continue => self.advance()?,
            Action::Back => self.retreat(),
            Action::StartNewReturn => self.start_new_return(),
        }
        Ok(())
    }

    /// Applies a completed simulated task. Reports scheduled before the last
    /// reset, and events for documents that were removed, are ignored.
    pub fn apply_event(
        &mut self,
        report: TaskReport,
    ) {
        let current = self.scheduler.generation();
        if report.generation != current {
            debug!(
                generation = report.generation,
                current,
                event = ?report.event,
                "ignoring report from a discarded return"
            );
            return;
        }
        match report.event {
            TaskEvent::DocumentProcessed(id) => {
                if self.record.complete_document(id) {
                    info!(document = %id, "document processed");
                } else {
                    debug!(document = %id, "ignoring completion for removed document");
                }
            }
            TaskEvent::IdentityCheckCompleted(method) => {
                if !verification::complete_pending(&mut self.record.verification, method) {
                    debug!(?method, "ignoring stale identity check");
                }
            }
            TaskEvent::SubmissionAccepted { confirmation } => {
                if self.submission == SubmissionStatus::Submitting {
                    info!(%confirmation, "return accepted");
                    self.submission = SubmissionStatus::Submitted {
                        confirmation,
                        submitted_on: Local::now().date_naive(),
                    };
                } else {
                    debug!("ignoring submission result for a discarded return");
                }
            }
        }
        self.tasks.retain(|t| !t.is_finished());
    }

    /// Writes the plain-text return summary into the configured output directory.
    pub fn download_summary(
        &self,
        label: &str,
    ) -> Result<PathBuf, WizardError> {
        self.download_summary_to(&self.output_dir, label)
    }

    pub fn download_summary_to(
        &self,
        dir: &Path,
        label: &str,
    ) -> Result<PathBuf, WizardError> {
        let summary = ReturnSummary::from_session(self);
        summary::write_summary(dir, self.tax_year, label, &summary)
    }

    fn answer_question(
        &mut self,
        choice: usize,
    ) -> Result<(), WizardError> {
        match verification::answer_question(&mut self.record.verification, choice) {
            Ok(KbaProgress::NextQuestion(index)) => {
                debug!(next = index, "question answered");
                Ok(())
            }
            Ok(KbaProgress::Passed) => Ok(()),
            Err(err @ VerificationError::KnowledgeCheckFailed { .. }) => {
                self.verification_error = Some(err.clone());
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn upload(
        &mut self,
        name: String,
        size_bytes: u64,
    ) {
        let id = self.record.add_document(name, size_bytes);
        info!(document = %id, size_bytes, "document uploaded");
        let handle = self.scheduler.process_document(id);
        self.track(handle);
    }

    fn submit(&mut self) -> Result<(), WizardError> {
        if self.submission != SubmissionStatus::Ready {
            return Err(WizardError::AlreadySubmitted(self.submission.label()));
        }
        self.submission = SubmissionStatus::Submitting;
        let handle = self.scheduler.submit_return();
        self.track(handle);
        Ok(())
    }

    fn advance(&mut self) -> Result<(), WizardError> {
        if self.step == Step::Registration {
            if let Err(err) = self.registration.validate() {
                warn!(fields = err.fields().len(), "registration incomplete");
                self.field_errors = err.fields().to_vec();
                return Err(err.into());
            }
            self.field_errors.clear();
            if !self.record.verification.is_verified() {
                return Err(VerificationError::OutOfOrder {
                    action: "continuing",
                    state: "identity is not verified",
                }
                .into());
            }
        }

        match self.step.next() {
            Some(next) => {
                info!(from = %self.step, to = %next, "advancing");
                self.step = next;
                if next == Step::TaxCalculation {
                    let estimate = self.estimate();
                    info!(
                        total_tax = %estimate.total_tax,
                        refund = %estimate.estimated_refund,
                        "estimate ready"
                    );
                }
            }
            None => self.start_new_return(),
        }
        Ok(())
    }

    fn retreat(&mut self) {
        if let Some(previous) = self.step.previous() {
            info!(from = %self.step, to = %previous, "going back");
            self.step = previous;
        }
    }

    /// Discards the record and returns to registration. Running tasks are
    /// cancelled.
    fn start_new_return(&mut self) {
        info!("starting a new return");
        for task in self.tasks.drain(..) {
            task.cancel();
        }
        self.scheduler.next_generation();
        self.step = Step::Registration;
        self.record = FilerRecord::new();
        self.registration = RegistrationForm::default();
        self.field_errors.clear();
        self.verification_error = None;
        self.submission = SubmissionStatus::Ready;
        self.refund_method = None;
        self.notifications = NotificationPreferences::default();
    }

    fn track(
        &mut self,
        handle: TaskHandle,
    ) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(handle);
    }

    fn clear_field_error(
        &mut self,
        field: &str,
    ) {
        self.field_errors.retain(|e| e.field != field);
    }
}

impl Drop for WizardSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.cancel();
        }
    }
}
