//! Normalization of French long-form dates ("18 juin 2025") to calendar dates.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use regex::Regex;

/// Day, month name and year, with an optional ordinal suffix on the day ("1er").
const LONG_DATE_PATTERN: &str = r"^\s*(\d{1,2})(?:er)?\s+(\p{L}+)\s+(\d{4})\s*$";

/// Month number for a lower-cased French month name.
///
/// Unaccented spellings are accepted since listings are not always consistent.
fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "janvier" => 1,
        "février" | "fevrier" => 2,
        "mars" => 3,
        "avril" => 4,
        "mai" => 5,
        "juin" => 6,
        "juillet" => 7,
        "août" | "aout" => 8,
        "septembre" => 9,
        "octobre" => 10,
        "novembre" => 11,
        "décembre" | "decembre" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parse a French long-form date such as `"18 juin 2025"`.
///
/// Matching is case-insensitive and tolerates surrounding whitespace.
///
/// # Errors
///
/// Returns `Error::Parse` when the string does not have the
/// `<day> <month> <year>` shape, the month name is unknown, or the day does
/// not exist in that month.
pub fn parse_french_date(raw: &str) -> Result<NaiveDate> {
    let re = Regex::new(LONG_DATE_PATTERN).map_err(|e| Error::Parse(e.to_string()))?;
    let lowered = raw.to_lowercase();
    let caps = re
        .captures(&lowered)
        .ok_or_else(|| Error::Parse(format!("unrecognized date format: {raw:?}")))?;

    let month_name = &caps[2];
    let month = month_number(month_name)
        .ok_or_else(|| Error::Parse(format!("unknown month: {month_name:?}")))?;

    let day: u32 = caps[1]
        .parse()
        .map_err(|_| Error::Parse(format!("invalid day in {raw:?}")))?;
    let year: i32 = caps[3]
        .parse()
        .map_err(|_| Error::Parse(format!("invalid year in {raw:?}")))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::Parse(format!("no such date: {raw:?}")))
}

/// Normalize to ISO `YYYY-MM-DD`.
///
/// # Errors
///
/// See [`parse_french_date`].
pub fn normalize(raw: &str) -> Result<String> {
    parse_french_date(raw).map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_simple_date() {
        assert_eq!(normalize("18 juin 2025").unwrap(), "2025-06-18");
    }

    #[test]
    fn parses_all_twelve_months() {
        let months = [
            "janvier",
            "février",
            "mars",
            "avril",
            "mai",
            "juin",
            "juillet",
            "août",
            "septembre",
            "octobre",
            "novembre",
            "décembre",
        ];
        for (i, name) in months.iter().enumerate() {
            let raw = format!("3 {name} 2024");
            let month = u32::try_from(i + 1).unwrap();
            assert_eq!(parse_french_date(&raw).unwrap(), ymd(2024, month, 3), "{raw}");
        }
    }

    #[test]
    fn case_insensitive_and_trimmed() {
        assert_eq!(parse_french_date("  5 DÉCEMBRE 2023\n").unwrap(), ymd(2023, 12, 5));
        assert_eq!(parse_french_date("12 Mars 2024").unwrap(), ymd(2024, 3, 12));
    }

    #[test]
    fn accepts_ordinal_first_day() {
        assert_eq!(parse_french_date("1er janvier 2025").unwrap(), ymd(2025, 1, 1));
    }

    #[test]
    fn accepts_unaccented_months() {
        assert_eq!(parse_french_date("14 aout 2024").unwrap(), ymd(2024, 8, 14));
        assert_eq!(parse_french_date("2 fevrier 2024").unwrap(), ymd(2024, 2, 2));
    }

    #[test]
    fn unknown_month_is_parse_error() {
        let err = parse_french_date("18 juni 2025").unwrap_err();
        assert!(matches!(err, Error::Parse(ref m) if m.contains("juni")));
    }

    #[test]
    fn wrong_shape_is_parse_error() {
        assert!(matches!(parse_french_date("2025-06-18"), Err(Error::Parse(_))));
        assert!(matches!(parse_french_date("juin 2025"), Err(Error::Parse(_))));
        assert!(matches!(parse_french_date(""), Err(Error::Parse(_))));
        assert!(matches!(
            parse_french_date("Séance du 18 juin 2025"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn impossible_day_is_parse_error() {
        assert!(matches!(parse_french_date("31 février 2025"), Err(Error::Parse(_))));
        assert!(matches!(parse_french_date("0 mars 2025"), Err(Error::Parse(_))));
    }
}
