//! Fragment-level helpers for listing extraction.

use std::sync::LazyLock;

use regex::Regex;

/// Marker that identifies a price fragment inside a listing container.
pub const CURRENCY_MARKER: char = '$';

static DATE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:today\b|\d+\s+days?\s+ago|[a-z]{3,}\s+\d{1,2}(?:st|nd|rd|th)?\b)")
        .expect("valid regex")
});

/// Parses a currency fragment into whole dollars by dropping every
/// non-digit character.
///
/// `"$123,456"` becomes `123456` and `"$1,200/mo"` becomes `1200`. Returns
/// `None` when the fragment has no digits or the digits overflow `u64`.
#[must_use]
pub fn parse_price_usd(fragment: &str) -> Option<u64> {
    let digits: String = fragment.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Returns `true` when a (trimmed) line looks like a listing date label:
/// `today`, `<N> day(s) ago`, or `<Word> <D>` with an optional ordinal.
#[must_use]
pub fn is_date_line(line: &str) -> bool {
    DATE_LINE_RE.is_match(line)
}

/// Returns the first line of `text` that looks like a date label, trimmed.
#[must_use]
pub fn find_date_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| is_date_line(line))
}

/// Returns the first fragment containing [`CURRENCY_MARKER`], trimmed.
#[must_use]
pub fn find_price_fragment<S: AsRef<str>>(fragments: &[S]) -> Option<&str> {
    fragments
        .iter()
        .map(|f| f.as_ref().trim())
        .find(|f| f.contains(CURRENCY_MARKER))
}
