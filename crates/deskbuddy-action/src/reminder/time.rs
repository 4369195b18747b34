//! Time-of-day matchers.

use std::sync::OnceLock;

use chrono::NaiveTime;
use regex::{Captures, Regex};

use super::{Match, Matcher};

/// Priority order: `H:MM [am|pm]`, then bare `H am|pm`.
pub(super) const MATCHERS: [Matcher<NaiveTime>; 2] = [clock, bare_hour];

pub(super) fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

fn clock(text: &str) -> Option<Match<NaiveTime>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:at\s+)?(\d{1,2}):(\d{2})(?:\s*([ap])\.?m\b\.?)?")
            .expect("Invalid clock time regex")
    });
    re.captures_iter(text).find_map(|caps| {
        let hour = caps[1].parse().ok()?;
        let minute = caps[2].parse().ok()?;
        let time = to_time(hour, minute, meridiem(&caps, 3))?;
        Some(Match {
            span: caps.get(0)?.range(),
            value: time,
        })
    })
}

fn bare_hour(text: &str) -> Option<Match<NaiveTime>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:at\s+)?(\d{1,2})\s*([ap])\.?m\b\.?")
            .expect("Invalid bare hour regex")
    });
    re.captures_iter(text).find_map(|caps| {
        let hour = caps[1].parse().ok()?;
        let time = to_time(hour, 0, meridiem(&caps, 2))?;
        Some(Match {
            span: caps.get(0)?.range(),
            value: time,
        })
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

fn meridiem(caps: &Captures<'_>, group: usize) -> Option<Meridiem> {
    caps.get(group).map(|m| {
        if m.as_str().eq_ignore_ascii_case("p") {
            Meridiem::Pm
        } else {
            Meridiem::Am
        }
    })
}

/// 12-hour clock when a meridiem is present (1..=12), 24-hour otherwise.
fn to_time(hour: u32, minute: u32, meridiem: Option<Meridiem>) -> Option<NaiveTime> {
    let hour = match meridiem {
        Some(_) if !(1..=12).contains(&hour) => return None,
        Some(Meridiem::Am) => hour % 12,
        Some(Meridiem::Pm) => hour % 12 + 12,
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}
