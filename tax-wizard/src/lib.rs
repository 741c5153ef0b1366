pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod payment;
pub mod runner;
pub mod session;
pub mod step;
pub mod summary;
pub mod tasks;
pub mod utils;
pub mod validation;
pub mod verification;
pub mod view;

pub use config::WizardConfig;
pub use error::{FieldError, ValidationError, VerificationError, WizardError};
pub use session::{Action, SubmissionStatus, WizardSession};
pub use step::Step;
pub use tasks::{TaskEvent, TaskReport};
