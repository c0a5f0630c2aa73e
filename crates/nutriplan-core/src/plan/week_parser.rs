//! Splits a free-text multi-week plan into per-week fragments.
//!
//! A new fragment starts at every line that begins with `Week <n>`. The
//! marker line stays in its fragment, and fragments are numbered by the
//! caller's starting week, not by the number written in the marker. Text
//! before the first marker is an introduction, not a week, and is dropped.

use std::sync::LazyLock;

use regex::Regex;

static WEEK_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Week\s+\d+").expect("week marker pattern is valid"));

/// One week's slice of a raw plan text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekFragment {
    pub week_number: i32,
    pub plan_text: String,
}

/// Whether `line` opens a new week.
pub fn is_week_marker(line: &str) -> bool {
    WEEK_MARKER.is_match(line)
}

/// Split `raw` into trimmed week fragments numbered from `first_week`.
///
/// Text with `k` markers yields exactly `k` fragments; text with no marker
/// becomes a single fragment. Blank input yields an empty vector.
pub fn parse_weeks(raw: &str, first_week: i32) -> Vec<WeekFragment> {
    let mut preamble: Vec<&str> = Vec::new();
    let mut chunks: Vec<Vec<&str>> = Vec::new();
    for line in raw.lines() {
        if is_week_marker(line) {
            chunks.push(Vec::new());
        }
        match chunks.last_mut() {
            Some(current) => current.push(line),
            None => preamble.push(line),
        }
    }
    if chunks.is_empty() {
        chunks.push(preamble);
    }

    chunks
        .into_iter()
        .map(|lines| lines.join("\n").trim().to_owned())
        .filter(|text| !text.is_empty())
        .zip(first_week..)
        .map(|(plan_text, week_number)| WeekFragment {
            week_number,
            plan_text,
        })
        .collect()
}
