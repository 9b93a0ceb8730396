use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Frequency;

/// Per-user reminder state, keyed by user id in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReminderState {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub reminder_frequency: Frequency,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_email_sent: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
    #[serde(default)]
    pub include_active_summary: bool,
}

impl UserReminderState {
    pub fn new(email: String, reminder_frequency: Frequency) -> Self {
        Self {
            email,
            reminder_frequency,
            last_email_sent: None,
            fcm_token: None,
            include_active_summary: false,
        }
    }

    pub fn push_token(&self) -> Option<&str> {
        self.fcm_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Fields merged into a user's state when they submit a record with reminders on.
#[derive(Debug, Clone)]
pub struct ReminderPreferenceUpdate {
    pub email: Option<String>,
    pub reminder_frequency: Frequency,
    pub include_active_summary: bool,
}
