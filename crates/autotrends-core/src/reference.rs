//! The per-run reference date against which relative labels are resolved.

use chrono::{FixedOffset, NaiveDate, Utc};

/// Returns today's calendar date in the given fixed timezone.
///
/// Call this once per run and pass the result everywhere; it is not meant to
/// be re-evaluated per record.
#[must_use]
pub fn reference_date(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

/// Parses a UTC offset such as `"+00:00"`, `"-05:00"`, `"+0530"` or `"Z"`.
///
/// Returns `None` for anything else, including offsets of 24 hours or more.
#[must_use]
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_aliases() {
        assert_eq!(parse_utc_offset("Z"), FixedOffset::east_opt(0));
        assert_eq!(parse_utc_offset("utc"), FixedOffset::east_opt(0));
        assert_eq!(parse_utc_offset("+00:00"), FixedOffset::east_opt(0));
    }

    #[test]
    fn parses_signed_offsets_with_and_without_colon() {
        assert_eq!(parse_utc_offset("+01:00"), FixedOffset::east_opt(3600));
        assert_eq!(parse_utc_offset("-0500"), FixedOffset::west_opt(5 * 3600));
        assert_eq!(
            parse_utc_offset("+05:30"),
            FixedOffset::east_opt(5 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn rejects_malformed_offsets() {
        assert!(parse_utc_offset("").is_none());
        assert!(parse_utc_offset("01:00").is_none());
        assert!(parse_utc_offset("+1").is_none());
        assert!(parse_utc_offset("+01:75").is_none());
        assert!(parse_utc_offset("+24:00").is_none());
        assert!(parse_utc_offset("Europe/London").is_none());
    }

    #[test]
    fn reference_date_is_stable_within_a_call_site() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let first = reference_date(offset);
        let second = reference_date(offset);
        // Both calls land on the same day except across midnight, where the
        // second can only be one day later.
        assert!(second == first || second == first.succ_opt().unwrap());
    }
}
