//! Parsing of typed commands into session actions.

use std::time::Duration;

use tax_core::{
    CreditField, DeductionMode, Dependent, DocumentId, FilingStatus, IncomeField,
    VerificationMethod,
};
use thiserror::Error;

use crate::payment::{NotificationChannel, RefundMethod};
use crate::session::Action;

pub const HELP: &str = "\
Registration:  email <addr> | password <pw> | phone <digits> | ssn <digits>
               verify <kba|document|third-party> | answer <n> | upload-id | start-check
               code <6 digits> | restart-verification
Data:          address <text> | status <single|mfj|mfs|hoh|none>
               dependent add <name> | <ssn> | <relationship> | dependent remove <n>
               income <wages|1099|investment|state> <amount> | deduction <standard|itemized>
               credit <child|education> <amount>
Documents:     upload <name> <bytes> | import | remove-doc <id>
Review:        submit | download <label>
Payment:       refund deposit <routing> <account> | refund check
Notifications: notify <email|sms|reminders> <on|off>
Navigation:    next | back | new
Other:         show | wait <ms> | log <filter> | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(Action),
    Download(String),
    /// Let simulated tasks run for a while (scripts).
    Wait(Duration),
    SetLogLevel(String),
    Show,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'; type 'help' for a list")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{value}' is not a valid {what}")]
    InvalidValue { what: &'static str, value: String },
}

fn invalid(
    what: &'static str,
    value: &str,
) -> CommandError {
    CommandError::InvalidValue {
        what,
        value: value.to_string(),
    }
}

fn required<'a>(
    rest: &'a str,
    usage: &'static str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(rest)
    }
}

/// Splits `rest` into the first word and the remainder.
fn split_word(rest: &str) -> (&str, &str) {
    match rest.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (rest, ""),
    }
}

fn parse_on_off(value: &str) -> Result<bool, CommandError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" => Ok(true),
        "off" | "no" | "false" => Ok(false),
        _ => Err(invalid("on/off value", value)),
    }
}

/// Parses one input line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(Command::Empty);
    }
    let (word, rest) = split_word(line);
    let action = |a: Action| Ok(Command::Action(a));

    match word.to_ascii_lowercase().as_str() {
        "email" => action(Action::SetEmail(required(rest, "email <address>")?.to_string())),
        "password" => action(Action::SetPassword(required(rest, "password <password>")?.to_string())),
        "phone" => action(Action::SetPhone(required(rest, "phone <digits>")?.to_string())),
        "ssn" => action(Action::SetSsn(required(rest, "ssn <digits>")?.to_string())),
        "verify" => {
            let value = required(rest, "verify <kba|document|third-party>")?;
            let method =
                VerificationMethod::parse(value).ok_or_else(|| invalid("verification method", value))?;
            action(Action::ChooseVerification(method))
        }
        "answer" => {
            let value = required(rest, "answer <choice number>")?;
            match value.parse::<usize>() {
                Ok(n) if n >= 1 => action(Action::AnswerQuestion(n - 1)),
                _ => Err(invalid("choice number", value)),
            }
        }
        "upload-id" => action(Action::UploadIdDocument),
        "start-check" => action(Action::StartProviderCheck),
        "code" => action(Action::ConfirmCode(required(rest, "code <6 digits>")?.to_string())),
        "restart-verification" => action(Action::RestartVerification),

        "address" => action(Action::SetAddress(required(rest, "address <text>")?.to_string())),
        "status" => {
            let value = required(rest, "status <single|mfj|mfs|hoh|none>")?;
            if value.eq_ignore_ascii_case("none") {
                return action(Action::SetFilingStatus(None));
            }
            let status = FilingStatus::parse(value).ok_or_else(|| invalid("filing status", value))?;
            action(Action::SetFilingStatus(Some(status)))
        }
        "dependent" => parse_dependent(rest),
        "income" => {
            let (field, amount) = split_word(required(rest, "income <field> <amount>")?);
            let field = IncomeField::parse(field).ok_or_else(|| invalid("income field", field))?;
            action(Action::SetIncome(field, amount.to_string()))
        }
        "deduction" => {
            let value = required(rest, "deduction <standard|itemized>")?;
            let mode = DeductionMode::parse(value).ok_or_else(|| invalid("deduction", value))?;
            action(Action::SetDeductionMode(mode))
        }
        "credit" => {
            let (field, amount) = split_word(required(rest, "credit <field> <amount>")?);
            let field = CreditField::parse(field).ok_or_else(|| invalid("credit", field))?;
            action(Action::SetCredit(field, amount.to_string()))
        }

        "upload" => {
            let usage = "upload <name> <bytes>";
            let (name, size) = required(rest, usage)?
                .rsplit_once(char::is_whitespace)
                .ok_or(CommandError::Usage(usage))?;
            let size_bytes = size.parse().map_err(|_| invalid("file size", size))?;
            action(Action::UploadDocument {
                name: name.trim().to_string(),
                size_bytes,
            })
        }
        "import" => action(Action::ImportFromProvider),
        "remove-doc" => {
            let value = required(rest, "remove-doc <id>")?;
            let id = value
                .trim_start_matches('#')
                .parse()
                .map_err(|_| invalid("document id", value))?;
            action(Action::RemoveDocument(DocumentId(id)))
        }

        "submit" => action(Action::Submit),
        "download" => Ok(Command::Download(required(rest, "download <label>")?.to_string())),
        "refund" => parse_refund(rest),
        "notify" => {
            let (channel, value) = split_word(required(rest, "notify <channel> <on|off>")?);
            let channel =
                NotificationChannel::parse(channel).ok_or_else(|| invalid("notification channel", channel))?;
            action(Action::SetNotification(channel, parse_on_off(value)?))
        }

        "next" | "continue" => action(Action::Continue),
        "back" => action(Action::Back),
        "new" => action(Action::StartNewReturn),

        "wait" => {
            let value = required(rest, "wait <milliseconds>")?;
            let ms = value.parse().map_err(|_| invalid("duration in ms", value))?;
            Ok(Command::Wait(Duration::from_millis(ms)))
        }
        "log" => Ok(Command::SetLogLevel(required(rest, "log <filter>")?.to_string())),
        "show" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(CommandError::Unknown(word.to_string())),
    }
}

fn parse_dependent(rest: &str) -> Result<Command, CommandError> {
    let (sub, args) = split_word(rest);
    match sub {
        "add" => {
            let usage = "dependent add <name> | <ssn> | <relationship>";
            let parts: Vec<&str> = args.split('|').map(str::trim).collect();
            let [name, ssn, relationship] = parts.as_slice() else {
                return Err(CommandError::Usage(usage));
            };
            if name.is_empty() {
                return Err(CommandError::Usage(usage));
            }
            Ok(Command::Action(Action::AddDependent(Dependent {
                name: name.to_string(),
                ssn: ssn.to_string(),
                relationship: relationship.to_string(),
            })))
        }
        "remove" => match args.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Command::Action(Action::RemoveDependent(n - 1))),
            _ => Err(invalid("dependent number", args)),
        },
        _ => Err(CommandError::Usage("dependent <add|remove> ...")),
    }
}

fn parse_refund(rest: &str) -> Result<Command, CommandError> {
    let usage = "refund deposit <routing> <account> | refund check";
    let (kind, args) = split_word(required(rest, usage)?);
    let method = match kind {
        "check" => RefundMethod::PaperCheck,
        "deposit" => {
            let (routing, account) = split_word(args);
            if routing.is_empty() || account.is_empty() {
                return Err(CommandError::Usage(usage));
            }
            RefundMethod::DirectDeposit {
                routing: routing.to_string(),
                account: account.to_string(),
            }
        }
        _ => return Err(CommandError::Usage(usage)),
    };
    Ok(Command::Action(Action::SetRefundMethod(method)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn action(line: &str) -> Action {
        match parse(line) {
            Ok(Command::Action(action)) => action,
            other => panic!("expected an action for '{line}', got {other:?}"),
        }
    }

    #[test]
    fn blank_and_comment_lines_are_empty() {
        assert_eq!(parse("   "), Ok(Command::Empty));
        assert_eq!(parse("# setup"), Ok(Command::Empty));
    }

    #[test]
    fn registration_commands() {
        assert_eq!(action("email user@example.com"), Action::SetEmail("user@example.com".into()));
        assert_eq!(action("phone 555 123 4567"), Action::SetPhone("555 123 4567".into()));
        assert_eq!(
            action("verify kba"),
            Action::ChooseVerification(VerificationMethod::KnowledgeBased)
        );
        assert_eq!(action("answer 2"), Action::AnswerQuestion(1));
        assert_eq!(action("code 123456"), Action::ConfirmCode("123456".into()));
    }

    #[test]
    fn answer_is_one_based() {
        assert_eq!(
            parse("answer 0"),
            Err(CommandError::InvalidValue {
                what: "choice number",
                value: "0".into()
            })
        );
    }

    #[test]
    fn data_commands() {
        assert_eq!(
            action("income 1099 12,500"),
            Action::SetIncome(IncomeField::Form1099, "12,500".into())
        );
        assert_eq!(action("status none"), Action::SetFilingStatus(None));
        assert_eq!(
            action("status mfj"),
            Action::SetFilingStatus(Some(FilingStatus::MarriedFilingJointly))
        );
        assert_eq!(
            action("credit child 2000"),
            Action::SetCredit(CreditField::ChildTax, "2000".into())
        );
    }

    #[test]
    fn dependent_add_splits_on_pipes() {
        assert_eq!(
            action("dependent add Sam Doe | 987-65-4321 | Child"),
            Action::AddDependent(Dependent {
                name: "Sam Doe".into(),
                ssn: "987-65-4321".into(),
                relationship: "Child".into(),
            })
        );
        assert!(parse("dependent add Sam").is_err());
    }

    #[test]
    fn upload_keeps_spaces_in_the_name() {
        assert_eq!(
            action("upload My W2 2024.pdf 20480"),
            Action::UploadDocument {
                name: "My W2 2024.pdf".into(),
                size_bytes: 20480
            }
        );
        assert_eq!(action("remove-doc #3"), Action::RemoveDocument(DocumentId(3)));
    }

    #[test]
    fn refund_and_notify_commands() {
        assert_eq!(action("refund check"), Action::SetRefundMethod(RefundMethod::PaperCheck));
        assert_eq!(
            action("refund deposit 021000021 000123456789"),
            Action::SetRefundMethod(RefundMethod::DirectDeposit {
                routing: "021000021".into(),
                account: "000123456789".into()
            })
        );
        assert_eq!(
            action("notify sms on"),
            Action::SetNotification(NotificationChannel::Sms, true)
        );
        assert!(parse("notify sms maybe").is_err());
    }

    #[test]
    fn non_action_commands() {
        assert_eq!(parse("download Federal"), Ok(Command::Download("Federal".into())));
        assert_eq!(parse("wait 2500"), Ok(Command::Wait(Duration::from_millis(2500))));
        assert_eq!(parse("log debug"), Ok(Command::SetLogLevel("debug".into())));
        assert_eq!(parse("QUIT"), Ok(Command::Quit));
    }

    #[test]
    fn missing_arguments_report_usage() {
        assert_eq!(parse("email"), Err(CommandError::Usage("email <address>")));
        assert_eq!(parse("upload w2.pdf"), Err(CommandError::Usage("upload <name> <bytes>")));
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(parse("fly away"), Err(CommandError::Unknown("fly".into())));
    }
}
