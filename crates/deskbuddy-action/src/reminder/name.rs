//! Task name extraction: whatever is left once temporal phrases and filler
//! words are gone.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use super::DEFAULT_NAME;

/// Cut every span out of `text` at once. Overlapping spans are merged and
/// each cut leaves a single space behind.
pub(super) fn remove_spans(text: &str, mut spans: Vec<Range<usize>>) -> String {
    spans.sort_by_key(|s| s.start);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        if span.start > cursor {
            out.push_str(&text[cursor..span.start]);
            out.push(' ');
        }
        cursor = cursor.max(span.end);
    }
    if cursor < text.len() {
        out.push_str(&text[cursor..]);
    }
    out
}

fn fillers() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            r"(?i)\bremind\s+me\s+(?:to|about|that)\b",
            r"(?i)\bset\s+(?:a\s+)?reminder(?:\s+(?:to|for)\b)?\s*:?",
            r"(?i)\badd\s+a\s+(?:task|reminder)(?:\s+(?:to|for)\b)?\s*:?",
            r"(?i)\bdon'?t\s+forget\s+to\b",
            r"(?i)\breminder\s*:",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Invalid filler regex"))
        .collect()
    })
}

fn edge_words() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:(?:on|at|by)\s+)+|(?:\s+(?:on|at|by))+$|^(?:on|at|by)$")
            .expect("Invalid edge word regex")
    })
}

/// Strip filler phrases, collapse whitespace and trim stray punctuation and
/// dangling prepositions. Never returns an empty string.
pub(super) fn clean(raw: &str) -> String {
    let mut name = raw.to_string();
    for filler in fillers() {
        name = filler.replace_all(&name, " ").into_owned();
    }

    let mut name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    loop {
        let trimmed = name
            .trim_start_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
            .trim_end_matches(|c: char| matches!(c, ',' | ';' | ':' | '-') || c.is_whitespace());
        let trimmed = edge_words().replace_all(trimmed, "").into_owned();
        if trimmed == name {
            break;
        }
        name = trimmed;
    }

    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name
    }
}
