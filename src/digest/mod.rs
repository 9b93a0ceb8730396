//! Reminder digests.
//!
//! A [`Digest`] is the typed form of a reminder email body. The batch
//! dispatcher builds one with [`compose_summary`] and hands it straight to
//! the HTML renderer; [`Digest::to_text`] produces the plain-text part of
//! the same email. [`parse_digest`] recovers a digest from text for callers
//! that only have the plain body.

use crate::types::{non_empty, PrayerRecord, RecordKind};
use std::fmt::Write;

mod parser;
pub use parser::parse_digest;

pub const SUMMARY_MARKER: &str = "--- Active Prayers Summary ---";
pub const SUMMARY_TITLE: &str = "Active Prayers Summary";
pub const DATE_PREFIX: &str = "Date: ";
pub const PRAY_FOR_PREFIX: &str = "Praying for: ";
pub const JOURNAL_PREFIX: &str = "Journal: ";
pub const SUMMARY_JOURNAL_PREFIX: &str = "  Journal: ";
/// Marks the second and later lines of a multi-line text or journal.
pub const CONTINUATION_PREFIX: &str = "    ";

/// One record as it appears in a digest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DigestItem {
    pub date: String,
    pub kind: Option<RecordKind>,
    pub text: String,
    pub pray_for: Option<String>,
    pub journal: Option<String>,
}

impl DigestItem {
    pub fn from_record(record: &PrayerRecord) -> Self {
        Self {
            date: record.date.clone(),
            kind: Some(record.kind),
            text: record.text.clone(),
            // Names stay on one line in the text form
            pray_for: record
                .pray_for()
                .map(|p| p.lines().collect::<Vec<_>>().join(" ")),
            journal: record.journal().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestEntry {
    /// Banner opening the active-records section.
    SummaryHeader,
    /// One line of the active-records section.
    SummaryItem(DigestItem),
    /// A freshly added record, shown as its own card.
    Card(DigestItem),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Digest {
    pub entries: Vec<DigestEntry>,
}

impl Digest {
    /// Number of records in the digest, header excluded.
    pub fn record_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !matches!(e, DigestEntry::SummaryHeader))
            .count()
    }

    pub fn extend(&mut self, other: Digest) {
        self.entries.extend(other.entries);
    }

    /// Plain-text rendering. Parsing the result with [`parse_digest`] yields
    /// the same entries; multi-line values are written with their later
    /// lines indented by [`CONTINUATION_PREFIX`].
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            match entry {
                DigestEntry::SummaryHeader => {
                    if !out.is_empty() && !out.ends_with("\n\n") {
                        out.push('\n');
                    }
                    out.push_str(SUMMARY_MARKER);
                    out.push('\n');
                }
                DigestEntry::SummaryItem(item) => write_summary_item(&mut out, item),
                DigestEntry::Card(item) => write_card(&mut out, item),
            }
        }
        out
    }
}

fn write_summary_item(out: &mut String, item: &DigestItem) {
    let label = item.kind.map(RecordKind::label).unwrap_or("PRAYER");
    let _ = write!(out, "\n{} - {}: ", item.date, label);
    write_lines(out, &item.text);
    if let Some(pray_for) = &item.pray_for {
        let _ = write!(out, " (Praying for: {})", pray_for);
    }
    if let Some(journal) = &item.journal {
        out.push('\n');
        out.push_str(SUMMARY_JOURNAL_PREFIX);
        write_lines(out, journal);
    }
    out.push('\n');
}

fn write_card(out: &mut String, item: &DigestItem) {
    let kind = item.kind.unwrap_or(RecordKind::Prayer);
    let _ = writeln!(out, "New {} added", kind);
    let _ = writeln!(out, "{}{}", DATE_PREFIX, item.date);
    if let Some(pray_for) = &item.pray_for {
        let _ = writeln!(out, "{}{}", PRAY_FOR_PREFIX, pray_for);
    }
    if let Some(journal) = &item.journal {
        out.push_str(JOURNAL_PREFIX);
        write_lines(out, journal);
        out.push('\n');
    }
    out.push('\n');
    write_lines(out, &item.text);
    out.push_str("\n\n");
}

fn write_lines(out: &mut String, value: &str) {
    let mut lines = value.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        out.push_str(CONTINUATION_PREFIX);
        out.push_str(line);
    }
}

/// Batch digest: the summary header followed by every non-archived record.
pub fn compose_summary(records: &[PrayerRecord]) -> Digest {
    let mut entries = vec![DigestEntry::SummaryHeader];
    entries.extend(
        records
            .iter()
            .filter(|r| !r.archived)
            .map(|r| DigestEntry::SummaryItem(DigestItem::from_record(r))),
    );
    Digest { entries }
}

/// Single-entry digest for a freshly added record. When the record asks for
/// it, the owner's active records follow as a summary section.
pub fn compose_new_entry(record: &PrayerRecord, active: &[PrayerRecord]) -> Digest {
    let mut digest = Digest {
        entries: vec![DigestEntry::Card(DigestItem::from_record(record))],
    };
    if record.include_active_summary && active.iter().any(|r| !r.archived) {
        digest.extend(compose_summary(active));
    }
    digest
}

pub(crate) fn clean(value: &str) -> Option<String> {
    non_empty(value).map(str::to_string)
}
