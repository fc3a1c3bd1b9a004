//! `<input type="datetime-local">` values.
//!
//! Browsers submit these without a zone; they are read and written as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

const FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a form value. Blank input is `Ok(None)`.
pub fn parse_datetime_local(input: &str) -> Result<Option<DateTime<Utc>>, chrono::ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let mut last_err = None;
    for format in FORMATS {
        match NaiveDateTime::parse_from_str(input, format) {
            Ok(naive) => return Ok(Some(naive.and_utc())),
            Err(e) => last_err = Some(e),
        }
    }

    match DateTime::parse_from_rfc3339(input) {
        Ok(dt) => Ok(Some(dt.with_timezone(&Utc))),
        Err(e) => Err(last_err.unwrap_or(e)),
    }
}

/// Formats a value for pre-filling a `datetime-local` input.
pub fn format_datetime_local(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_blank_is_none() {
        assert_eq!(parse_datetime_local("  ").unwrap(), None);
    }

    #[test]
    fn test_browser_format() {
        assert_eq!(
            parse_datetime_local("2030-05-01T13:45").unwrap(),
            Some(Utc.with_ymd_and_hms(2030, 5, 1, 13, 45, 0).unwrap())
        );
    }

    #[test]
    fn test_rfc3339_with_offset() {
        assert_eq!(
            parse_datetime_local("2030-05-01T15:45:00+02:00").unwrap(),
            Some(Utc.with_ymd_and_hms(2030, 5, 1, 13, 45, 0).unwrap())
        );
    }

    #[test]
    fn test_garbage() {
        assert!(parse_datetime_local("next tuesday").is_err());
    }

    #[test]
    fn test_format_matches_parse() {
        let at = Utc.with_ymd_and_hms(2031, 1, 2, 3, 4, 0).unwrap();
        assert_eq!(format_datetime_local(&at), "2031-01-02T03:04");
        assert_eq!(
            parse_datetime_local(&format_datetime_local(&at)).unwrap(),
            Some(at)
        );
    }
}
