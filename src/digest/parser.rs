use super::{
    clean, Digest, DigestEntry, DigestItem, CONTINUATION_PREFIX, DATE_PREFIX, JOURNAL_PREFIX,
    PRAY_FOR_PREFIX, SUMMARY_JOURNAL_PREFIX, SUMMARY_MARKER,
};
use crate::types::RecordKind;
use regex::Regex;
use std::sync::LazyLock;

static SUMMARY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2}) - (PRAYER|PRAISE): (.+?)(?: \(Praying for: (.+)\))?$")
        .expect("summary line pattern is valid")
});

static PRAY_FOR_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?) \(Praying for: (.+)\)$").expect("pray-for suffix pattern is valid")
});

/// Value an indented continuation line extends.
#[derive(Debug, Clone, Copy)]
enum Continued {
    OpenJournal,
    LastText,
    LastJournal,
}

/// Rebuilds a digest from its plain-text form.
///
/// Lines are matched in a fixed priority order: continuation of the previous
/// value, new-entry marker, labelled field, summary marker, summary line,
/// then body text. Anything that fits none of these is dropped; the parser
/// never fails.
pub fn parse_digest(text: &str) -> Digest {
    let mut entries = Vec::new();
    let mut current: Option<DigestItem> = None;
    let mut in_summary = false;
    let mut continued: Option<Continued> = None;

    for line in text.lines() {
        let pending = continued.take();
        if let (Some(target), Some(rest)) = (pending, line.strip_prefix(CONTINUATION_PREFIX)) {
            continued = continue_value(target, rest, current.as_mut(), entries.last_mut());
        } else if let Some(kind) = new_entry_marker(line) {
            current = Some(DigestItem {
                kind: Some(kind),
                ..DigestItem::default()
            });
        } else if let Some(rest) = line.strip_prefix(DATE_PREFIX) {
            if let Some(item) = current.as_mut() {
                item.date = rest.to_string();
            }
        } else if let Some(rest) = line.strip_prefix(PRAY_FOR_PREFIX) {
            if let Some(item) = current.as_mut() {
                item.pray_for = clean(rest);
            }
        } else if let Some(rest) = line.strip_prefix(JOURNAL_PREFIX) {
            if let Some(item) = current.as_mut() {
                item.journal = clean(rest);
                continued = Some(Continued::OpenJournal);
            }
        } else if line.contains(SUMMARY_MARKER) {
            in_summary = true;
            entries.push(DigestEntry::SummaryHeader);
        } else if in_summary && line.starts_with(SUMMARY_JOURNAL_PREFIX) {
            if let Some(DigestEntry::SummaryItem(item)) = entries.last_mut() {
                item.journal = clean(&line[SUMMARY_JOURNAL_PREFIX.len()..]);
                continued = Some(Continued::LastJournal);
            }
        } else if in_summary && line.contains(" - ") {
            if let Some(item) = parse_summary_line(line) {
                if item.pray_for.is_none() {
                    continued = Some(Continued::LastText);
                }
                entries.push(DigestEntry::SummaryItem(item));
            }
        } else if !line.trim().is_empty() {
            // First unlabelled line closes the open entry
            if let Some(mut item) = current.take_if(|item| item.text.is_empty()) {
                item.text = line.to_string();
                entries.push(DigestEntry::Card(item));
                continued = Some(Continued::LastText);
            }
        }
    }

    Digest { entries }
}

/// Appends `rest` as a new line of the targeted value. A summary item's
/// text may end in the pray-for suffix, which closes it.
fn continue_value(
    target: Continued,
    rest: &str,
    open: Option<&mut DigestItem>,
    last: Option<&mut DigestEntry>,
) -> Option<Continued> {
    match target {
        Continued::OpenJournal => {
            push_line(open?.journal.get_or_insert_with(String::new), rest);
            Some(target)
        }
        Continued::LastJournal => {
            push_line(last_item(last)?.journal.get_or_insert_with(String::new), rest);
            Some(target)
        }
        Continued::LastText => match last? {
            DigestEntry::SummaryItem(item) => match PRAY_FOR_SUFFIX.captures(rest) {
                Some(caps) => {
                    push_line(&mut item.text, &caps[1]);
                    item.pray_for = clean(&caps[2]);
                    None
                }
                None => {
                    push_line(&mut item.text, rest);
                    Some(target)
                }
            },
            DigestEntry::Card(item) => {
                push_line(&mut item.text, rest);
                Some(target)
            }
            DigestEntry::SummaryHeader => None,
        },
    }
}

fn last_item(entry: Option<&mut DigestEntry>) -> Option<&mut DigestItem> {
    match entry? {
        DigestEntry::SummaryItem(item) | DigestEntry::Card(item) => Some(item),
        DigestEntry::SummaryHeader => None,
    }
}

fn push_line(value: &mut String, line: &str) {
    value.push('\n');
    value.push_str(line);
}

fn new_entry_marker(line: &str) -> Option<RecordKind> {
    if line.contains("New prayer added") {
        Some(RecordKind::Prayer)
    } else if line.contains("New praise added") {
        Some(RecordKind::Praise)
    } else {
        None
    }
}

fn parse_summary_line(line: &str) -> Option<DigestItem> {
    let caps = SUMMARY_LINE.captures(line)?;
    Some(DigestItem {
        date: caps[1].to_string(),
        kind: RecordKind::from_label(&caps[2]),
        text: caps[3].to_string(),
        pray_for: caps.get(4).and_then(|m| clean(m.as_str())),
        journal: None,
    })
}
