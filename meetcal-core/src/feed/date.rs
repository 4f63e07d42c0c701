//! Date handling for feed titles and publication timestamps.

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ParseError;

/// Formats the feed is known to use for the date part of a title.
const DATETIME_FORMATS: &[&str] = &[
    "%B %d, %Y %I:%M %p",
    "%B %d %Y %I:%M %p",
    "%A, %B %d, %Y %I:%M %p",
    "%B %d, %Y %H:%M",
    "%m/%d/%y %I:%M %p",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

// `%y` comes before `%Y`: chrono reads "24" as year 24 under `%Y`.
const DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%A, %B %d, %Y",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y-%m-%d",
];

/// Earliest year a meeting date may fall in.
const MIN_YEAR: i32 = 1000;

/// `pubDate` values that carry no zone.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%a, %d %b %Y %H:%M:%S", "%d %b %Y %H:%M:%S"];

/// Parse the date part of a feed title into a local (feed time zone) date-time.
///
/// Known formats are tried first. Anything else goes through the
/// natural-language parser. A date without a time means local midnight.
pub fn parse_local_date(input: &str) -> Result<NaiveDateTime, ParseError> {
    let normalized = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Err(ParseError::UnparseableDate(input.to_string()));
    }

    let parsed = parse_known_format(&normalized).or_else(|| {
        let expanded = expand_abbreviations(&normalized);
        let dt = fuzzydate::parse(&expanded).ok()?;
        // fuzzydate fills a missing time with the current time of day
        if has_time_component(&normalized) {
            Some(dt)
        } else {
            Some(dt.date().and_time(NaiveTime::MIN))
        }
    });

    match parsed {
        Some(dt) if dt.year() >= MIN_YEAR => Ok(dt),
        _ => Err(ParseError::UnparseableDate(input.to_string())),
    }
}

fn parse_known_format(input: &str) -> Option<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    None
}

/// Whether a date string names a time of day ("7pm", "19:00", "noon", "at 7").
fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();

    if lower.contains("noon") || lower.contains("midnight") {
        return true;
    }

    let bytes = lower.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        let am_pm = (b == b'a' || b == b'p') && bytes.get(i + 1) == Some(&b'm');
        if am_pm {
            let digit_before = i > 0 && bytes[i - 1].is_ascii_digit();
            let digit_space_before = i > 1 && bytes[i - 1] == b' ' && bytes[i - 2].is_ascii_digit();
            if digit_before || digit_space_before {
                return true;
            }
        }

        if b == b':' {
            let digit_before = i > 0 && bytes[i - 1].is_ascii_digit();
            let digit_after = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
            if digit_before && digit_after {
                return true;
            }
        }
    }

    let after_at = lower
        .find(" at ")
        .map(|pos| &lower[pos + 4..])
        .or_else(|| lower.strip_prefix("at "));
    after_at.is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
}

/// Expand abbreviated month and weekday names for the natural-language parser.
///
/// Output is lowercased; a trailing `,` or `.` stays on its word.
fn expand_abbreviations(input: &str) -> String {
    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            let bare = word.trim_end_matches([',', '.']);
            let punct = &word[bare.len()..];
            format!("{}{}", full_name(bare).unwrap_or(bare), punct)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn full_name(abbrev: &str) -> Option<&'static str> {
    let name = match abbrev {
        "mon" => "monday",
        "tue" | "tues" => "tuesday",
        "wed" => "wednesday",
        "thu" | "thur" | "thurs" => "thursday",
        "fri" => "friday",
        "sat" => "saturday",
        "sun" => "sunday",
        "jan" => "january",
        "feb" => "february",
        "mar" => "march",
        "apr" => "april",
        "jun" => "june",
        "jul" => "july",
        "aug" => "august",
        "sep" | "sept" => "september",
        "oct" => "october",
        "nov" => "november",
        "dec" => "december",
        _ => return None,
    };
    Some(name)
}

/// Interpret a local date-time in the feed time zone and convert it to UTC.
///
/// The offset comes from the zone's rules for that date, so summer dates in
/// New York get -04:00 and winter dates -05:00. In the repeated fall-back
/// hour the earlier instant wins.
pub fn localize(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, ParseError> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(ParseError::NonexistentLocalTime(local.to_string())),
    }
}

/// Parse an RSS `pubDate` into UTC.
///
/// RFC 2822 timestamps keep their own offset; zone-less timestamps are
/// read in the feed time zone.
pub fn parse_published(input: &str, tz: Tz) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(trimmed, format) {
            return localize(local, tz);
        }
    }

    Err(ParseError::InvalidTimestamp(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use chrono_tz::America::New_York;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_feed_title_formats() {
        assert_eq!(
            parse_local_date("Jun 5, 2024 7:00 PM").unwrap(),
            naive(2024, 6, 5, 19, 0)
        );
        assert_eq!(
            parse_local_date("June 5 2024").unwrap(),
            naive(2024, 6, 5, 0, 0)
        );
        assert_eq!(
            parse_local_date("06/05/2024 6:30 PM").unwrap(),
            naive(2024, 6, 5, 18, 30)
        );
        assert_eq!(
            parse_local_date("2024-06-05").unwrap(),
            naive(2024, 6, 5, 0, 0)
        );
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        assert_eq!(
            parse_local_date("  Jun  5,   2024   7:00 PM ").unwrap(),
            naive(2024, 6, 5, 19, 0)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_local_date(""),
            Err(ParseError::UnparseableDate(_))
        ));
        assert!(matches!(
            parse_local_date("sometime soonish maybe"),
            Err(ParseError::UnparseableDate(_))
        ));
    }

    #[test]
    fn test_date_only_fallback_is_midnight() {
        assert_eq!(
            parse_local_date("5 June 2024").unwrap(),
            naive(2024, 6, 5, 0, 0)
        );
        assert_eq!(
            parse_local_date("Jun 5th 2024").unwrap(),
            naive(2024, 6, 5, 0, 0)
        );
        // Stable across calls, not tied to the wall clock
        assert_eq!(
            parse_local_date("5 June 2024").unwrap(),
            parse_local_date("5 June 2024").unwrap()
        );
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(parse_local_date("6/5/24").unwrap(), naive(2024, 6, 5, 0, 0));
        assert_eq!(
            parse_local_date("6/5/24 7:00 PM").unwrap(),
            naive(2024, 6, 5, 19, 0)
        );
        assert_eq!(
            parse_local_date("6/5/2024").unwrap(),
            naive(2024, 6, 5, 0, 0)
        );
    }

    #[test]
    fn test_implausible_year_is_rejected() {
        assert!(matches!(
            parse_local_date("0024-06-05"),
            Err(ParseError::UnparseableDate(_))
        ));
    }

    #[test]
    fn test_has_time_component() {
        assert!(has_time_component("June 5 2024 7pm"));
        assert!(has_time_component("June 5 2024 7 PM"));
        assert!(has_time_component("June 5 2024 19:00"));
        assert!(has_time_component("June 5 2024 at 7"));
        assert!(has_time_component("June 5 2024 noon"));
        assert!(!has_time_component("5 June 2024"));
        assert!(!has_time_component("Jun 5th 2024"));
        assert!(!has_time_component("Wednesday, June 5, 2024"));
    }

    #[test]
    fn test_expand_abbreviations_keeps_punctuation() {
        assert_eq!(expand_abbreviations("Wed, Jun 5"), "wednesday, june 5");
    }

    #[test]
    fn test_expand_abbreviations_feed_strings() {
        assert_eq!(
            expand_abbreviations("Thurs. Sept 12, 2024"),
            "thursday. september 12, 2024"
        );
        assert_eq!(
            expand_abbreviations("Tue Dec 3 2024 7:00 PM"),
            "tuesday december 3 2024 7:00 pm"
        );
        // Full names and unknown words pass through lowercased
        assert_eq!(expand_abbreviations("Mar. 4, 2025"), "march. 4, 2025");
        assert_eq!(expand_abbreviations("May 14th 2024"), "may 14th 2024");
        assert_eq!(expand_abbreviations("Marching Band"), "marching band");
    }

    #[test]
    fn test_localize_uses_daylight_offset_in_summer() {
        let utc = localize(naive(2024, 6, 5, 19, 0), New_York).unwrap();
        assert_eq!(utc, naive(2024, 6, 5, 23, 0).and_utc());
    }

    #[test]
    fn test_localize_uses_standard_offset_in_winter() {
        let utc = localize(naive(2024, 1, 10, 19, 0), New_York).unwrap();
        assert_eq!(utc, naive(2024, 1, 11, 0, 0).and_utc());
    }

    #[test]
    fn test_localize_fall_back_hour_picks_earlier_instant() {
        // 01:30 happens twice on 2024-11-03 in New York
        let utc = localize(naive(2024, 11, 3, 1, 30), New_York).unwrap();
        assert_eq!(utc.hour(), 5);
    }

    #[test]
    fn test_localize_spring_forward_gap_is_error() {
        let result = localize(naive(2024, 3, 10, 2, 30), New_York);
        assert!(matches!(result, Err(ParseError::NonexistentLocalTime(_))));
    }

    #[test]
    fn test_parse_published_rfc2822() {
        let utc = parse_published("Wed, 05 Jun 2024 14:00:00 GMT", New_York).unwrap();
        assert_eq!(utc, naive(2024, 6, 5, 14, 0).and_utc());

        let utc = parse_published("Wed, 05 Jun 2024 10:00:00 -0400", New_York).unwrap();
        assert_eq!(utc, naive(2024, 6, 5, 14, 0).and_utc());
    }

    #[test]
    fn test_parse_published_without_zone_uses_feed_zone() {
        let utc = parse_published("Wed, 05 Jun 2024 10:00:00", New_York).unwrap();
        assert_eq!(utc, naive(2024, 6, 5, 14, 0).and_utc());
    }

    #[test]
    fn test_parse_published_invalid() {
        assert!(matches!(
            parse_published("yesterday-ish", New_York),
            Err(ParseError::InvalidTimestamp(_))
        ));
    }
}
