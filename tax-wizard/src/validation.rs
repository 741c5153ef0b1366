//! Registration field validation.
//!
//! Each field reports only its first failing rule, but every failing field is
//! reported, so the form can show all messages at once.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FieldError, ValidationError};
use crate::utils::digits_only;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static SSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{2}-\d{4}$").expect("ssn pattern is valid"));

pub const MIN_PASSWORD_LEN: usize = 6;

/// Values typed on the registration screen.
///
/// Phone and SSN are stored already formatted; see [`crate::utils`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub phone: String,
    pub ssn: String,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_valid_ssn(ssn: &str) -> bool {
    SSN.is_match(ssn)
}

pub fn is_valid_phone(phone: &str) -> bool {
    digits_only(phone, usize::MAX).len() == 10
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

impl RegistrationForm {
    /// Validates all four fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !is_valid_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Please enter a valid email address"));
        }

        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }

        if self.phone.trim().is_empty() {
            errors.push(FieldError::new("phone", "Phone number is required"));
        } else if !is_valid_phone(&self.phone) {
            errors.push(FieldError::new("phone", "Phone number must be 10 digits"));
        }

        if self.ssn.trim().is_empty() {
            errors.push(FieldError::new("ssn", "SSN is required"));
        } else if !is_valid_ssn(&self.ssn) {
            errors.push(FieldError::new("ssn", "SSN must be in XXX-XX-XXXX format"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(count = errors.len(), "registration form rejected");
            Err(ValidationError(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            email: "user@example.com".to_string(),
            password: "secret1".to_string(),
            phone: "(555) 123-4567".to_string(),
            ssn: "123-45-6789".to_string(),
        }
    }

    #[test]
    fn email_pattern_accepts_and_rejects() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@mail.co.uk"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("plainstring"));
        assert!(!is_valid_email("user name@example.com"));
    }

    #[test]
    fn ssn_pattern_requires_dashes() {
        assert!(is_valid_ssn("123-45-6789"));
        assert!(!is_valid_ssn("123456789"));
        assert!(!is_valid_ssn("123-45-678"));
    }

    #[test]
    fn phone_needs_exactly_ten_digits() {
        assert!(is_valid_phone("5551234567"));
        assert!(is_valid_phone("(555) 123-4567"));
        assert!(!is_valid_phone("555123456"));
        assert!(!is_valid_phone("55512345678"));
    }

    #[test]
    fn code_must_be_six_digits() {
        assert!(is_valid_code("000000"));
        assert!(is_valid_code("482913"));
        assert!(!is_valid_code("12345"));
        assert!(!is_valid_code("1234567"));
        assert!(!is_valid_code("12a456"));
    }

    #[test]
    fn valid_form_passes() {
        assert_eq!(valid_form().validate(), Ok(()));
    }

    #[test]
    fn every_failing_field_is_reported() {
        let form = RegistrationForm {
            email: "user@".to_string(),
            password: "abc".to_string(),
            phone: String::new(),
            ssn: "12-345".to_string(),
        };

        let err = form.validate().unwrap_err();

        assert_eq!(err.fields().len(), 4);
        assert_eq!(err.message_for("email"), Some("Please enter a valid email address"));
        assert_eq!(
            err.message_for("password"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(err.message_for("phone"), Some("Phone number is required"));
        assert_eq!(err.message_for("ssn"), Some("SSN must be in XXX-XX-XXXX format"));
    }

    #[test]
    fn only_failing_fields_are_reported() {
        let form = RegistrationForm {
            password: "12345".to_string(),
            ..valid_form()
        };

        let err = form.validate().unwrap_err();

        assert_eq!(err.fields().len(), 1);
        assert_eq!(err.fields()[0].field, "password");
    }
}
