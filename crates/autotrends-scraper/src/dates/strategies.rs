//! The built-in [`DateStrategy`] implementations.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};
use regex::Regex;

use super::DateStrategy;

static RELATIVE_DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)\s+days?\s+ago").expect("valid regex"));
static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{3,})\s+(\d{1,2})(?:st|nd|rd|th)?").expect("valid regex")
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Free-form date layouts tried by [`GenericStrategy`], most specific first.
/// Two-digit years come before four-digit ones so `05/07/24` is not read as
/// the year 24.
const GENERIC_DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
];
const GENERIC_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// `"today"` in any letter case, surrounding whitespace ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodayStrategy;

impl DateStrategy for TodayStrategy {
    fn name(&self) -> &'static str {
        "today"
    }

    fn try_parse(&self, label: &str, reference: NaiveDate) -> Option<NaiveDate> {
        label.trim().eq_ignore_ascii_case("today").then_some(reference)
    }
}

/// `"<N> day ago"` / `"<N> days ago"`, resolved as `reference - N` days.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeDaysStrategy;

impl DateStrategy for RelativeDaysStrategy {
    fn name(&self) -> &'static str {
        "relative_days"
    }

    fn try_parse(&self, label: &str, reference: NaiveDate) -> Option<NaiveDate> {
        let caps = RELATIVE_DAYS_RE.captures(label.trim())?;
        let days: u64 = caps.get(1)?.as_str().parse().ok()?;
        reference.checked_sub_days(Days::new(days))
    }
}

/// `"<month> <day>"` with an optional ordinal suffix, in the reference year.
///
/// Accepts full month names and three-letter abbreviations in any case.
/// Impossible combinations such as `"Feb 30th"` do not match.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthDayStrategy;

impl DateStrategy for MonthDayStrategy {
    fn name(&self) -> &'static str {
        "month_day"
    }

    fn try_parse(&self, label: &str, reference: NaiveDate) -> Option<NaiveDate> {
        let caps = MONTH_DAY_RE.captures(label.trim())?;
        let month = month_number(caps.get(1)?.as_str())?;
        let day: u32 = caps.get(2)?.as_str().parse().ok()?;
        NaiveDate::from_ymd_opt(reference.year(), month, day)
    }
}

/// Best-effort parse of absolute dates and timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericStrategy;

impl DateStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn try_parse(&self, label: &str, _reference: NaiveDate) -> Option<NaiveDate> {
        let s = label.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(dt.date_naive());
        }

        GENERIC_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
            .or_else(|| {
                GENERIC_DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(|dt| dt.date())
            })
    }
}

/// Maps a full or three-letter month name to `1..=12`.
fn month_number(word: &str) -> Option<u32> {
    let lower = word.to_ascii_lowercase();
    let index = MONTHS
        .iter()
        .position(|full| *full == lower || (lower.len() == 3 && full.starts_with(&lower)))?;
    u32::try_from(index + 1).ok()
}
