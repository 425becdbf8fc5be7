//! Tolerant decoder for external booking-calendar feeds.
//!
//! Booking channels export reservations as iCalendar text. The feeds in the
//! wild are only loosely RFC 5545 shaped, so the decoder is deliberately
//! forgiving: it unfolds continuation lines, consumes the five properties the
//! reconciliation engine needs (`UID`, `SUMMARY`, `DESCRIPTION`, `DTSTART`,
//! `DTEND`), ignores everything else, and silently drops event blocks that
//! lack a uid, start, or end. Decoding is a pure transformation with no I/O.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time::{local_instant, local_midnight};

/// A single event decoded from a calendar feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEvent {
    /// The feed-assigned identifier, unique within one feed.
    pub uid: String,
    /// The event title, unescaped.
    pub summary: Option<String>,
    /// The event description, unescaped.
    pub description: Option<String>,
    /// When the block starts.
    pub start: DateTime<Utc>,
    /// When the block ends (exclusive).
    pub end: DateTime<Utc>,
}

impl FeedEvent {
    /// Returns true if the event is ongoing or in the future at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.end >= now
    }
}

/// Decodes a calendar document into its event records.
///
/// Malformed surroundings (stray lines, unknown properties, truncated
/// blocks) never fail the decode; they only shrink the result.
pub fn decode_feed(content: &str) -> Vec<FeedEvent> {
    let mut events = Vec::new();
    let mut current: Option<PartialEvent> = None;

    for line in unfold_lines(content) {
        if line.starts_with("BEGIN:VEVENT") {
            current = Some(PartialEvent::default());
        } else if line.starts_with("END:VEVENT") {
            if let Some(partial) = current.take() {
                match partial.finish() {
                    Some(event) => events.push(event),
                    None => debug!("dropping event block missing uid, start, or end"),
                }
            }
        } else if let Some(partial) = current.as_mut()
            && let Some((name, value)) = split_property(&line)
        {
            partial.apply(name, value);
        }
    }

    events
}

/// Keeps only events still relevant at `now`.
///
/// With `include_ongoing`, events whose end has not passed survive;
/// otherwise only events that have not yet started do.
pub fn filter_active(
    events: Vec<FeedEvent>,
    now: DateTime<Utc>,
    include_ongoing: bool,
) -> Vec<FeedEvent> {
    events
        .into_iter()
        .filter(|event| {
            if include_ongoing {
                event.is_active_at(now)
            } else {
                event.start >= now
            }
        })
        .collect()
}

/// Joins folded lines: a line starting with one space or tab continues the
/// previous logical line, with the fold character stripped.
fn unfold_lines(content: &str) -> Vec<String> {
    let mut logical: Vec<String> = Vec::new();

    for raw in content.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if (line.starts_with(' ') || line.starts_with('\t'))
            && let Some(last) = logical.last_mut()
        {
            last.push_str(&line[1..]);
        } else {
            logical.push(line.to_string());
        }
    }

    logical
}

/// Splits a content line into `(name-with-parameters, value)` at the first
/// colon. Lines without a property name are skipped.
fn split_property(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(':')?;
    if idx == 0 {
        return None;
    }
    Some((&line[..idx], &line[idx + 1..]))
}

#[derive(Default)]
struct PartialEvent {
    uid: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl PartialEvent {
    fn apply(&mut self, name: &str, value: &str) {
        // Parameters ride on the name: DTSTART;VALUE=DATE:20240601
        let base = name.split(';').next().unwrap_or(name);
        match base {
            "UID" => self.uid = Some(value.to_string()),
            "SUMMARY" => self.summary = Some(unescape_text(value)),
            "DESCRIPTION" => self.description = Some(unescape_text(value)),
            "DTSTART" => self.start = parse_stamp(name, value),
            "DTEND" => self.end = parse_stamp(name, value),
            _ => {}
        }
    }

    fn finish(self) -> Option<FeedEvent> {
        Some(FeedEvent {
            uid: self.uid?,
            summary: self.summary,
            description: self.description,
            start: self.start?,
            end: self.end?,
        })
    }
}

/// Parses a `DTSTART`/`DTEND` value.
///
/// 8-character values and `VALUE=DATE` parameters are whole days at local
/// midnight. Longer values are `YYYYMMDDTHHMMSS`, UTC when `Z`-suffixed and
/// local time otherwise. Unparseable stamps yield `None`, which drops the
/// enclosing event like any other missing required field.
fn parse_stamp(name: &str, value: &str) -> Option<DateTime<Utc>> {
    let date_only = name.contains("VALUE=DATE") && !name.contains("VALUE=DATE-TIME");

    if date_only || value.len() == 8 {
        let digits = value.get(..8)?;
        let date = NaiveDate::parse_from_str(digits, "%Y%m%d").ok()?;
        return Some(local_midnight(date));
    }

    if let Some(trimmed) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(trimmed, "%Y%m%dT%H%M%S").ok()?;
        return Some(Utc.from_utc_datetime(&naive));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    Some(local_instant(naive))
}

/// Unescapes iCalendar text: `\n`, `\,`, `\;`, `\\`.
fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
