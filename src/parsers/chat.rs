//! Parser for exported WhatsApp chat text.
//!
//! Two header layouts are recognised:
//!
//! ```text
//! 31/12/2023, 22:15 - Alice: Happy new year!          (Android)
//! [31/12/2023, 22:15:03] Alice: Happy new year!       (iOS)
//! ```
//!
//! Lines that don't start with a header continue the previous message. A header whose
//! remainder has no `Sender: ` part is a system message. Day/month order is inferred
//! from the whole file: any first field above 12 means day-first, any second field
//! above 12 means month-first, otherwise day-first.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use tracing::debug;

use crate::models::Message;

static ANDROID_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{1,4})[./-](\d{1,2})[./-](\d{1,4}),?\s+(\d{1,2})[.:](\d{2})(?:[.:](\d{2}))?(?:\s*([aApP])\.?\s?[mM]\.?)?\s+-\s(.*)$",
    )
    .expect("android header pattern is valid")
});

static IOS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[(\d{1,4})[./-](\d{1,2})[./-](\d{1,4}),?\s+(\d{1,2})[.:](\d{2})(?:[.:](\d{2}))?(?:\s*([aApP])\.?\s?[mM]\.?)?\]\s(.*)$",
    )
    .expect("ios header pattern is valid")
});

static SENDER_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+?):\s(.*)$").expect("sender pattern is valid"));

static IOS_ATTACHMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<attached:\s*([^>]+)>").expect("attachment pattern is valid"));

static ANDROID_ATTACHMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S(?:.*?\S)?\.\w{1,5})\s\(file attached\)").expect("attachment pattern is valid")
});

/// Directional marks WhatsApp sprinkles into exports
const INVISIBLE_MARKS: [char; 3] = ['\u{200e}', '\u{200f}', '\u{feff}'];

/// Header fields captured before the day/month order is known
#[derive(Debug)]
struct RawEntry {
    date: [u32; 3],
    year_first: bool,
    hour: u32,
    minute: u32,
    second: u32,
    meridiem: Option<char>,
    sender: Option<String>,
    body: String,
}

/// Parse exported chat text into messages in source order.
///
/// With `anonymize`, sender names are replaced by stable pseudonyms, see
/// [`anonymize_senders`]. Order and count are never changed.
pub fn parse_messages(content: &str, anonymize: bool) -> Vec<Message> {
    let mut raw_entries: Vec<RawEntry> = Vec::new();
    let mut orphan_lines = 0usize;

    for line in content.lines() {
        let line = line.trim_start_matches(INVISIBLE_MARKS);
        match parse_header(line) {
            Some(entry) => raw_entries.push(entry),
            None => match raw_entries.last_mut() {
                Some(previous) => {
                    previous.body.push('\n');
                    previous.body.push_str(&strip_marks(line));
                }
                None => {
                    if !line.trim().is_empty() {
                        orphan_lines += 1;
                    }
                }
            },
        }
    }

    let days_first = infer_days_first(&raw_entries);
    let mut dropped = 0usize;
    let mut messages = Vec::with_capacity(raw_entries.len());

    for entry in raw_entries {
        let Some(timestamp) = build_timestamp(&entry, days_first) else {
            dropped += 1;
            continue;
        };
        let attachment = detect_attachment(&entry.body);
        messages.push(Message {
            index: messages.len() + 1,
            timestamp,
            sender: entry.sender,
            body: entry.body,
            attachment,
        });
    }

    if orphan_lines > 0 || dropped > 0 {
        debug!(
            messages = messages.len(),
            orphan_lines, dropped, "Parsed chat export with skipped content"
        );
    }

    if anonymize {
        anonymize_senders(&mut messages);
    }
    messages
}

/// Replace sender names by `User 1`, `User 2`, ... in first-appearance order.
///
/// The mapping depends only on the message sequence, so repeated runs over the same
/// input produce the same pseudonyms.
pub fn anonymize_senders(messages: &mut [Message]) {
    let mut pseudonyms: HashMap<String, String> = HashMap::new();
    for message in messages.iter_mut() {
        if let Some(sender) = message.sender.take() {
            let next = pseudonyms.len() + 1;
            let alias = pseudonyms.entry(sender).or_insert_with(|| format!("User {next}"));
            message.sender = Some(alias.clone());
        }
    }
}

fn parse_header(line: &str) -> Option<RawEntry> {
    let captures = ANDROID_HEADER.captures(line).or_else(|| IOS_HEADER.captures(line))?;
    let number = |i: usize| captures.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let date = [number(1)?, number(2)?, number(3)?];
    let year_first = captures.get(1).is_some_and(|m| m.as_str().len() == 4);
    let meridiem = captures
        .get(7)
        .and_then(|m| m.as_str().chars().next())
        .map(|c| c.to_ascii_lowercase());
    let rest = captures.get(8).map(|m| m.as_str()).unwrap_or_default();

    let (sender, body) = match SENDER_SPLIT.captures(rest) {
        Some(split) => (
            Some(strip_marks(&split[1]).trim().to_string()),
            strip_marks(&split[2]),
        ),
        None => (None, strip_marks(rest)),
    };

    Some(RawEntry {
        date,
        year_first,
        hour: number(4)?,
        minute: number(5)?,
        second: number(6).unwrap_or(0),
        meridiem,
        sender,
        body,
    })
}

fn infer_days_first(entries: &[RawEntry]) -> bool {
    let numeric = entries.iter().filter(|e| !e.year_first);
    if numeric.clone().any(|e| e.date[0] > 12) {
        return true;
    }
    if numeric.clone().any(|e| e.date[1] > 12) {
        return false;
    }
    true
}

fn build_timestamp(entry: &RawEntry, days_first: bool) -> Option<NaiveDateTime> {
    let (year, month, day) = if entry.year_first {
        (entry.date[0], entry.date[1], entry.date[2])
    } else if days_first {
        (entry.date[2], entry.date[1], entry.date[0])
    } else {
        (entry.date[2], entry.date[0], entry.date[1])
    };
    let year = if year < 100 { year + 2000 } else { year };

    let hour = match entry.meridiem {
        Some('p') if entry.hour < 12 => entry.hour + 12,
        Some('a') if entry.hour == 12 => 0,
        _ => entry.hour,
    };

    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, entry.minute, entry.second)?;
    Some(NaiveDateTime::new(date, time))
}

fn detect_attachment(body: &str) -> Option<String> {
    if let Some(captures) = IOS_ATTACHMENT.captures(body) {
        return Some(captures[1].trim().to_string());
    }
    ANDROID_ATTACHMENT.captures(body).map(|c| c[1].to_string())
}

fn strip_marks(text: &str) -> String {
    text.chars().filter(|c| !INVISIBLE_MARKS.contains(c)).collect()
}
