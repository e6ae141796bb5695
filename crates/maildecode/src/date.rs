//! `Date` / `Resent-Date` header parsing.

use chrono::{DateTime, FixedOffset};

use crate::error::{Error, Result};

/// RFC 1123 with a numeric zone: `Mon, 02 Jan 2006 15:04:05 -0700`.
const RFC1123Z: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Same layout with the weekday already stripped.
const WITHOUT_WEEKDAY: &str = "%d %b %Y %H:%M:%S %z";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Parses a date header. Empty values yield `None`.
///
/// The value is tried as RFC 1123 with a numeric zone and a two-digit day,
/// then as `Mon, 2 Jan 2006 15:04:05 -0700` where the day may have one
/// digit. The weekday must be a valid abbreviation but is not checked
/// against the date.
///
/// # Errors
///
/// Returns [`Error::DateParse`] if neither layout matches.
pub fn parse_date(field: &str, value: &str) -> Result<Option<DateTime<FixedOffset>>> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_rfc1123z(value)
        .or_else(|| parse_lenient_day(value))
        .map(Some)
        .ok_or_else(|| Error::DateParse {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn parse_rfc1123z(value: &str) -> Option<DateTime<FixedOffset>> {
    let day = value.split(' ').nth(1)?;
    if day.len() != 2 {
        return None;
    }
    DateTime::parse_from_str(value, RFC1123Z).ok()
}

fn parse_lenient_day(value: &str) -> Option<DateTime<FixedOffset>> {
    let (weekday, rest) = value.split_once(", ")?;
    if !WEEKDAYS.contains(&weekday) {
        return None;
    }
    let day = rest.split(' ').next()?;
    if day.is_empty() || day.len() > 2 {
        return None;
    }
    DateTime::parse_from_str(rest, WITHOUT_WEEKDAY).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_empty_is_none() {
        assert_eq!(parse_date("Date", "").unwrap(), None);
    }

    #[test]
    fn test_rfc1123z() {
        let date = parse_date("Date", "Fri, 21 Nov 1997 09:55:06 -0600")
            .unwrap()
            .unwrap();
        assert_eq!(date.year(), 1997);
        assert_eq!(date.month(), 11);
        assert_eq!(date.day(), 21);
        assert_eq!(date.hour(), 9);
        assert_eq!(date.offset().local_minus_utc(), -6 * 3600);
    }

    #[test]
    fn test_single_digit_day() {
        let date = parse_date("Date", "Mon, 2 Jan 2006 15:04:05 -0700")
            .unwrap()
            .unwrap();
        assert_eq!(date.day(), 2);
        assert_eq!(date.minute(), 4);
    }

    #[test]
    fn test_weekday_not_cross_checked() {
        // 2 Jan 2006 was a Monday.
        let date = parse_date("Date", "Sun, 2 Jan 2006 15:04:05 +0000")
            .unwrap()
            .unwrap();
        assert_eq!(date.day(), 2);
    }

    #[test]
    fn test_invalid_dates() {
        for value in [
            "yesterday",
            "2006-01-02T15:04:05Z",
            "Mon, 02 Jan 2006 15:04:05 MST",
            "Xyz, 2 Jan 2006 15:04:05 -0700",
            "02 Jan 2006 15:04:05 -0700",
        ] {
            let err = parse_date("Resent-Date", value).unwrap_err();
            assert!(
                matches!(err, Error::DateParse { ref field, .. } if field == "Resent-Date"),
                "{value:?}"
            );
        }
    }
}
