//! Payment and refund options, refund tracking and notification preferences.
//!
//! Refund tracking is mock data: the timeline is derived from the submission
//! date alone.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::digits_only;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundMethod {
    DirectDeposit { routing: String, account: String },
    PaperCheck,
}

impl RefundMethod {
    /// Describes the method with the account number masked.
    pub fn describe(&self) -> String {
        match self {
            Self::DirectDeposit { routing, account } => {
                let digits = digits_only(account, usize::MAX);
                let tail = &digits[digits.len().saturating_sub(4)..];
                format!("Direct deposit (routing {routing}, account ending {tail})")
            }
            Self::PaperCheck => "Paper check by mail".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundStage {
    Received,
    Approved,
    Sent,
}

impl RefundStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Received => "Return received",
            Self::Approved => "Refund approved",
            Self::Sent => "Refund sent",
        }
    }

    /// Days after submission the stage is expected.
    fn expected_after(&self) -> u64 {
        match self {
            Self::Received => 0,
            Self::Approved => 14,
            Self::Sent => 21,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingEntry {
    pub stage: RefundStage,
    pub expected_on: Option<NaiveDate>,
    pub reached: bool,
}

/// Refund tracking timeline. Before submission no stage is reached and no
/// dates are known; after it only "received" is reached.
pub fn refund_timeline(submitted_on: Option<NaiveDate>) -> Vec<TrackingEntry> {
    [RefundStage::Received, RefundStage::Approved, RefundStage::Sent]
        .into_iter()
        .map(|stage| TrackingEntry {
            stage,
            expected_on: submitted_on
                .and_then(|date| date.checked_add_days(Days::new(stage.expected_after()))),
            reached: submitted_on.is_some() && stage == RefundStage::Received,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationChannel {
    Email,
    Sms,
    Reminders,
}

impl NotificationChannel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Some(Self::Email),
            "sms" | "text" => Some(Self::Sms),
            "reminders" | "reminder" => Some(Self::Reminders),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email: bool,
    pub sms: bool,
    /// Reminder before next filing season.
    pub reminders: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            sms: false,
            reminders: true,
        }
    }
}

impl NotificationPreferences {
    pub fn set(
        &mut self,
        channel: NotificationChannel,
        enabled: bool,
    ) {
        match channel {
            NotificationChannel::Email => self.email = enabled,
            NotificationChannel::Sms => self.sms = enabled,
            NotificationChannel::Reminders => self.reminders = enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn direct_deposit_masks_account() {
        let method = RefundMethod::DirectDeposit {
            routing: "021000021".to_string(),
            account: "000123456789".to_string(),
        };

        assert_eq!(
            method.describe(),
            "Direct deposit (routing 021000021, account ending 6789)"
        );
    }

    #[test]
    fn timeline_before_submission_has_no_dates() {
        let timeline = refund_timeline(None);

        assert_eq!(timeline.len(), 3);
        assert!(timeline.iter().all(|e| e.expected_on.is_none() && !e.reached));
    }

    #[test]
    fn timeline_after_submission_marks_received() {
        let submitted = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        let timeline = refund_timeline(Some(submitted));

        assert!(timeline[0].reached);
        assert!(!timeline[1].reached);
        assert_eq!(timeline[1].expected_on, NaiveDate::from_ymd_opt(2024, 4, 15));
        assert_eq!(timeline[2].expected_on, NaiveDate::from_ymd_opt(2024, 4, 22));
    }

    #[test]
    fn preferences_toggle_independently() {
        let mut prefs = NotificationPreferences::default();
        prefs.set(NotificationChannel::Sms, true);
        prefs.set(NotificationChannel::Email, false);

        assert_eq!(
            prefs,
            NotificationPreferences {
                email: false,
                sms: true,
                reminders: true
            }
        );
    }
}
