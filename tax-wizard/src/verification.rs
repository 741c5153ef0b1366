//! Identity verification sub-flow of the registration step.
//!
//! ```text
//! NotStarted ──choose──▶ KnowledgeBased ──2 correct──▶ AwaitingCode ──code──▶ Verified
//!     ▲                        │
//!     └────── 2 wrong ─────────┘
//! NotStarted ──choose──▶ Document ──upload, delay──▶ AwaitingCode
//! NotStarted ──choose──▶ ThirdParty ──start, delay──▶ AwaitingCode
//! ```
//!
//! Document and third-party checks never fail; their completion arrives as a
//! task event and is applied with [`complete_pending`].

use tax_core::{VerificationMethod, VerificationState};
use tracing::{info, warn};

use crate::error::VerificationError;
use crate::validation::is_valid_code;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KbaQuestion {
    pub prompt: &'static str,
    pub choices: &'static [&'static str],
    /// Index into `choices`.
    pub correct: usize,
}

pub const QUESTION_BANK: [KbaQuestion; 3] = [
    KbaQuestion {
        prompt: "Which of these streets have you lived on?",
        choices: &["Maple Avenue", "Oak Street", "Pine Road", "None of the above"],
        correct: 1,
    },
    KbaQuestion {
        prompt: "Which of these lenders has issued you an auto loan?",
        choices: &["First National Bank", "Auto Credit Union", "Metro Finance", "None of the above"],
        correct: 3,
    },
    KbaQuestion {
        prompt: "In which county was your social security number issued?",
        choices: &["Franklin County", "Jefferson County", "Washington County", "Madison County"],
        correct: 2,
    },
];

pub const REQUIRED_CORRECT: usize = 2;

/// What happens after a knowledge-based answer is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KbaProgress {
    /// Ask the question at this index next.
    NextQuestion(usize),
    /// Threshold reached; the flow is now awaiting the confirmation code.
    Passed,
}

fn state_name(state: &VerificationState) -> &'static str {
    match state {
        VerificationState::NotStarted => "choosing a verification method",
        VerificationState::KnowledgeBased { .. } => "answering identity questions",
        VerificationState::Document { .. } => "verifying an ID document",
        VerificationState::ThirdParty { .. } => "waiting on the identity provider",
        VerificationState::AwaitingCode { .. } => "waiting for the verification code",
        VerificationState::Verified { .. } => "already verified",
    }
}

fn out_of_order(
    action: &'static str,
    state: &VerificationState,
) -> VerificationError {
    VerificationError::OutOfOrder {
        action,
        state: state_name(state),
    }
}

/// Starts (or switches to) a verification method. Progress in any other
/// method is discarded.
pub fn choose_method(
    state: &mut VerificationState,
    method: VerificationMethod,
) -> Result<(), VerificationError> {
    if state.is_verified() {
        return Err(out_of_order("choosing a method", state));
    }
    *state = match method {
        VerificationMethod::KnowledgeBased => VerificationState::KnowledgeBased {
            answers: Vec::new(),
        },
        VerificationMethod::Document => VerificationState::Document { uploaded: false },
        VerificationMethod::ThirdParty => VerificationState::ThirdParty { started: false },
    };
    info!(?method, "verification method chosen");
    Ok(())
}

/// The question currently awaiting an answer, with its index.
pub fn current_question(state: &VerificationState) -> Option<(usize, &'static KbaQuestion)> {
    match state {
        VerificationState::KnowledgeBased { answers } => {
            QUESTION_BANK.get(answers.len()).map(|q| (answers.len(), q))
        }
        _ => None,
    }
}

/// Records an answer (`choice` is an index into the current question's choices).
///
/// Fails with [`VerificationError::KnowledgeCheckFailed`] as soon as the
/// threshold becomes unreachable; the state then returns to `NotStarted` with
/// all answers cleared.
pub fn answer_question(
    state: &mut VerificationState,
    choice: usize,
) -> Result<KbaProgress, VerificationError> {
    let Some((index, question)) = current_question(state) else {
        return Err(out_of_order("answering a question", state));
    };
    if choice >= question.choices.len() {
        return Err(VerificationError::InvalidAnswer(choice + 1));
    }
    let VerificationState::KnowledgeBased { answers } = &mut *state else {
        return Err(out_of_order("answering a question", state));
    };

    answers.push(choice == question.correct);
    let correct = answers.iter().filter(|ok| **ok).count();
    let wrong = answers.len() - correct;

    if correct >= REQUIRED_CORRECT {
        info!(correct, "knowledge-based verification passed");
        *state = VerificationState::AwaitingCode {
            method: VerificationMethod::KnowledgeBased,
        };
        return Ok(KbaProgress::Passed);
    }

    if wrong > QUESTION_BANK.len() - REQUIRED_CORRECT {
        warn!(correct, wrong, "knowledge-based verification failed");
        *state = VerificationState::NotStarted;
        return Err(VerificationError::KnowledgeCheckFailed {
            correct,
            required: REQUIRED_CORRECT,
        });
    }

    Ok(KbaProgress::NextQuestion(index + 1))
}

/// Marks the ID document as uploaded; processing completes via [`complete_pending`].
pub fn mark_document_uploaded(state: &mut VerificationState) -> Result<(), VerificationError> {
    if let VerificationState::Document { uploaded } = state {
        if !*uploaded {
            *uploaded = true;
            return Ok(());
        }
    }
    Err(out_of_order("uploading an ID document", state))
}

/// Starts the identity provider check; completes via [`complete_pending`].
pub fn start_third_party(state: &mut VerificationState) -> Result<(), VerificationError> {
    if let VerificationState::ThirdParty { started } = state {
        if !*started {
            *started = true;
            return Ok(());
        }
    }
    Err(out_of_order("starting the provider check", state))
}

/// Applies the completion of a pending document or provider check.
///
/// Returns `false` when the event is stale, e.g. the user switched methods
/// while the check was running.
pub fn complete_pending(
    state: &mut VerificationState,
    method: VerificationMethod,
) -> bool {
    let pending = matches!(
        (&*state, method),
        (VerificationState::Document { uploaded: true }, VerificationMethod::Document)
            | (VerificationState::ThirdParty { started: true }, VerificationMethod::ThirdParty)
    );
    if pending {
        info!(?method, "identity check completed");
        *state = VerificationState::AwaitingCode { method };
    }
    pending
}

/// Accepts any 6-digit numeric code.
pub fn confirm_code(
    state: &mut VerificationState,
    code: &str,
) -> Result<(), VerificationError> {
    let VerificationState::AwaitingCode { method } = *state else {
        return Err(out_of_order("confirming a code", state));
    };
    if !is_valid_code(code.trim()) {
        return Err(VerificationError::InvalidCode);
    }
    info!(?method, "identity verified");
    *state = VerificationState::Verified { method };
    Ok(())
}

/// Returns to method selection, discarding progress.
pub fn restart(state: &mut VerificationState) {
    *state = VerificationState::NotStarted;
}
