//! Calendar date matchers.
//!
//! Matchers only recognise text; turning a match into a concrete date needs
//! `now` and the parsed time, which happens in [`DateRef::resolve`].

use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;

use super::{Match, Matcher};

/// Priority order. A named weekday outranks an explicit month and day.
pub(super) const MATCHERS: [Matcher<DateRef>; 5] =
    [relative, weekday, month_day, day_month, numeric];

/// How far ahead to look for the next valid occurrence of a year-less date.
/// Feb 29 can be up to eight years away.
const MAX_YEARS_AHEAD: i32 = 8;

/// Year used to validate a year-less month/day; a leap year so Feb 29 passes.
const LEAP_YEAR: i32 = 2000;

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

const WEEKDAYS: &str =
    "monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thur|thu|friday|fri|saturday|sunday";

/// A recognised date, not yet anchored to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DateRef {
    /// Days after today.
    InDays(u64),
    Weekday { day: Weekday, next: bool },
    Absolute(NaiveDate),
    YearLess { month: u32, day: u32 },
}

impl DateRef {
    pub(super) fn resolve(self, now: NaiveDateTime, time: NaiveTime) -> NaiveDate {
        let today = now.date();
        match self {
            DateRef::InDays(n) => today.checked_add_days(Days::new(n)).unwrap_or(today),
            DateRef::Weekday { day, next } => {
                let ahead = (7 + day.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
                let mut days = if ahead == 0 { 7 } else { ahead };
                if next {
                    days += 7;
                }
                today
                    .checked_add_days(Days::new(u64::from(days)))
                    .unwrap_or(today)
            }
            DateRef::Absolute(date) => date,
            DateRef::YearLess { month, day } => (now.year()..=now.year() + MAX_YEARS_AHEAD)
                .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
                .find(|date| date.and_time(time) >= now)
                .unwrap_or(today),
        }
    }
}

fn relative(text: &str) -> Option<Match<DateRef>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)\b(today|tonight|tomorrow|next\s+week)\b")
            .expect("Invalid relative date regex")
    });
    let caps = re.captures(text)?;
    let word = caps[1].to_ascii_lowercase();
    let days = match word.as_str() {
        "today" | "tonight" => 0,
        "tomorrow" => 1,
        _ => 7,
    };
    Some(Match {
        span: caps.get(0)?.range(),
        value: DateRef::InDays(days),
    })
}

fn weekday(text: &str) -> Option<Match<DateRef>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b(?:on\s+)?(next\s+)?({})\b", WEEKDAYS))
            .expect("Invalid weekday regex")
    });
    re.captures_iter(text).find_map(|caps| {
        let day = parse_weekday(&caps[2])?;
        Some(Match {
            span: caps.get(0)?.range(),
            value: DateRef::Weekday {
                day,
                next: caps.get(1).is_some(),
            },
        })
    })
}

fn month_day(text: &str) -> Option<Match<DateRef>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b(?:on\s+)?({})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?",
            MONTHS
        ))
        .expect("Invalid month-day regex")
    });
    re.captures_iter(text).find_map(|caps| {
        let month = parse_month(&caps[1])?;
        let day = caps[2].parse().ok()?;
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        Some(Match {
            span: caps.get(0)?.range(),
            value: calendar(year, month, day)?,
        })
    })
}

fn day_month(text: &str) -> Option<Match<DateRef>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b(?:on\s+)?(?:the\s+)?(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({})\b\.?(?:,?\s+(\d{{4}})\b)?",
            MONTHS
        ))
        .expect("Invalid day-month regex")
    });
    re.captures_iter(text).find_map(|caps| {
        let day = caps[1].parse().ok()?;
        let month = parse_month(&caps[2])?;
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        Some(Match {
            span: caps.get(0)?.range(),
            value: calendar(year, month, day)?,
        })
    })
}

/// `D/M` or `M/D`, optionally followed by `/YY` or `/YYYY`. D/M is tried
/// first; M/D only when D/M is not a valid date.
fn numeric(text: &str) -> Option<Match<DateRef>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\b(?:on\s+)?(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b")
            .expect("Invalid numeric date regex")
    });
    re.captures_iter(text).find_map(|caps| {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = caps.get(3).and_then(|y| {
            let raw = y.as_str();
            let n: i32 = raw.parse().ok()?;
            Some(if raw.len() == 2 { 2000 + n } else { n })
        });
        let value = calendar(year, second, first).or_else(|| calendar(year, first, second))?;
        Some(Match {
            span: caps.get(0)?.range(),
            value,
        })
    })
}

/// Validate a month/day, with or without an explicit year.
fn calendar(year: Option<i32>, month: u32, day: u32) -> Option<DateRef> {
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day).map(DateRef::Absolute),
        None => NaiveDate::from_ymd_opt(LEAP_YEAR, month, day)
            .map(|_| DateRef::YearLess { month, day }),
    }
}

fn parse_month(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    let lower = name.to_ascii_lowercase();
    let day = match lower.get(..3)? {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}
