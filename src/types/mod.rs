use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;

mod reminder;
mod smtp;
pub use reminder::*;
pub use smtp::*;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    #[default]
    Never,
}

impl Frequency {
    /// Minimum time that must have passed since the last send. `None` for `Never`.
    pub fn threshold(self) -> Option<TimeDelta> {
        match self {
            Frequency::Daily => Some(TimeDelta::hours(24)),
            Frequency::Weekly => Some(TimeDelta::days(7)),
            Frequency::Monthly => Some(TimeDelta::days(30)),
            Frequency::Never => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Never => "never",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Prayer,
    Praise,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Prayer => "prayer",
            RecordKind::Praise => "praise",
        }
    }

    /// Upper-cased label used on digest summary lines.
    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Prayer => "PRAYER",
            RecordKind::Praise => "PRAISE",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "PRAYER" => Some(RecordKind::Prayer),
            "PRAISE" => Some(RecordKind::Praise),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prayer or praise entry owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerRecord {
    pub id: String,
    pub user_id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub text: String,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub pray_for: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub reminder_frequency: Frequency,
    #[serde(default)]
    pub include_active_summary: bool,
}

impl PrayerRecord {
    pub fn pray_for(&self) -> Option<&str> {
        non_empty(&self.pray_for)
    }

    pub fn journal(&self) -> Option<&str> {
        non_empty(&self.journal)
    }

    /// Case-insensitive match over text, journal and kind.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.text.to_lowercase().contains(&needle)
            || self.journal.to_lowercase().contains(&needle)
            || self.kind.as_str().contains(&needle)
    }
}

/// Body of a record submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrayer {
    pub user_id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub text: String,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub pray_for: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub reminder_frequency: Frequency,
    #[serde(default)]
    pub include_active_summary: bool,
}

impl NewPrayer {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("userId is required".to_string());
        }
        if self.text.trim().is_empty() {
            return Err("text is required".to_string());
        }
        if NaiveDate::parse_from_str(&self.date, DATE_FORMAT).is_err() {
            return Err(format!("date must be YYYY-MM-DD, got '{}'", self.date));
        }
        Ok(())
    }

    pub fn into_record(self, id: String) -> PrayerRecord {
        PrayerRecord {
            id,
            user_id: self.user_id,
            date: self.date,
            kind: self.kind,
            text: self.text,
            journal: self.journal,
            pray_for: self.pray_for,
            archived: false,
            reminder_frequency: self.reminder_frequency,
            include_active_summary: self.include_active_summary,
        }
    }
}

pub(crate) fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
