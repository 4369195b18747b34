//! Free-text reminder parsing.
//!
//! Extracts a task name, a calendar date and a time of day from text such as
//! "remind me to call mom tomorrow at 3:30 pm".
//!
//! Each axis (time, date) is a list of independent matchers tried in
//! priority order. The first matcher that fires decides the value, but the
//! spans of every matcher that fired are cut out of the name, so a losing
//! "aug 18" never leaks into "team meeting".

mod date;
mod name;
mod time;

use std::ops::Range;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Result of [`parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedReminder {
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// A matcher hit: the byte span it covers in the input and what it means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Match<T> {
    pub span: Range<usize>,
    pub value: T,
}

type Matcher<T> = fn(&str) -> Option<Match<T>>;

/// Name used when nothing is left after removing temporal phrases.
pub const DEFAULT_NAME: &str = "Reminder";

/// Parse `text` relative to the local moment `now`.
///
/// Never fails: a missing time defaults to noon, a missing date to today and
/// an empty name to [`DEFAULT_NAME`].
pub fn parse(text: &str, now: NaiveDateTime) -> ParsedReminder {
    let mut spans = Vec::new();

    let time = first_of(&time::MATCHERS, text, &mut spans).unwrap_or_else(time::noon);
    let date = first_of(&date::MATCHERS, text, &mut spans)
        .map(|date| date.resolve(now, time))
        .unwrap_or_else(|| now.date());
    let name = name::clean(&name::remove_spans(text, spans));

    tracing::debug!(%text, %name, %date, %time, "reminder parsed");
    ParsedReminder { name, date, time }
}

/// Run every matcher, recording every hit's span; the first hit wins.
fn first_of<T>(matchers: &[Matcher<T>], text: &str, spans: &mut Vec<Range<usize>>) -> Option<T> {
    let mut winner = None;
    for matcher in matchers {
        if let Some(hit) = matcher(text) {
            spans.push(hit.span);
            if winner.is_none() {
                winner = Some(hit.value);
            }
        }
    }
    winner
}
