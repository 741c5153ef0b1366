//! Error taxonomy for the wizard.
//!
//! Nothing here is fatal: every variant describes a condition the user can
//! correct and retry from the same screen.

use std::{fmt, io, path::PathBuf};

use tax_core::DocumentId;
use thiserror::Error;

use crate::step::Step;

/// One field that failed validation, with the message shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Field-level validation failures. Each failing field appears once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} field(s) need attention", .0.len())]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Message for `field`, if it failed.
    pub fn message_for(
        &self,
        field: &str,
    ) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Recoverable failures inside the identity verification sub-flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("identity could not be verified: {correct} of {required} questions answered correctly")]
    KnowledgeCheckFailed { correct: usize, required: usize },

    #[error("no answer numbered {0}; choose one of the listed answers")]
    InvalidAnswer(usize),

    #[error("enter the 6-digit verification code")]
    InvalidCode,

    #[error("{action} is not available while {state}")]
    OutOfOrder {
        action: &'static str,
        state: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("{action} is only available on the {expected} step (currently on {actual})")]
    WrongStep {
        action: &'static str,
        expected: Step,
        actual: Step,
    },

    #[error("no document {0}")]
    UnknownDocument(DocumentId),

    #[error("no dependent at position {0}")]
    UnknownDependent(usize),

    #[error("return has already been {0}")]
    AlreadySubmitted(&'static str),

    #[error("cannot write summary to '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
