//! Conversions between spreadsheet cell text and stored values
//!
//! Dates travel as `yyyy-MM-dd HH:mm:ss`. Currency cells in hand-authored
//! workbooks look like `Rp74,000`; storage keeps a bare integer.

use crate::error::{IjahError, IjahResult};
use chrono::{NaiveDate, NaiveDateTime};

/// Canonical date text: `yyyy-MM-dd HH:mm:ss`
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Day filters in requests and on the command line: `yyyy-MM-dd`
pub const DAY_FORMAT: &str = "%Y-%m-%d";

pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_number(n: i64) -> String {
    n.to_string()
}

/// Parse a timestamp as the storage engine returns it.
///
/// Drivers may append a zone suffix (`2018-01-01 10:00:00 +0000 UTC`, `... +00:00`),
/// so everything from the first `+` is dropped first.
pub fn parse_stored_date(raw: &str) -> IjahResult<NaiveDateTime> {
    let text = raw.split('+').next().unwrap_or_default().trim();
    NaiveDateTime::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| IjahError::InvalidDate(format!("'{}': {}", raw, e)))
}

/// Strict parse of hand-entered date text; unlike imports there is no fallback
pub fn parse_date(text: &str) -> IjahResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| IjahError::InvalidDate(format!("'{}': {}", text, e)))
}

pub fn parse_day(text: &str) -> IjahResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DAY_FORMAT)
        .map_err(|e| IjahError::InvalidDate(format!("'{}': {}", text, e)))
}

/// Coerce a date cell. Malformed text becomes `now` so one bad cell never
/// aborts a sheet.
pub fn import_date(text: &str, now: NaiveDateTime) -> String {
    match NaiveDateTime::parse_from_str(text, DATE_FORMAT) {
        Ok(date) => format_date(&date),
        Err(_) => format_date(&now),
    }
}

/// Coerce a currency cell: `Rp74,000` → `74000`
pub fn import_currency(text: &str) -> String {
    text.replace("Rp", "").replace(',', "")
}

/// Order descriptions are typed as `<note> <order code>`; exactly two
/// space-separated tokens yield the code, anything else yields nothing.
pub fn split_order_reference(text: &str) -> String {
    let tokens: Vec<&str> = text.split(' ').collect();
    match tokens.as_slice() {
        [_, code] => code.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_import_date_keeps_canonical_text() {
        assert_eq!(import_date("2023-05-01 10:00:00", noon()), "2023-05-01 10:00:00");
    }

    #[test]
    fn test_import_date_falls_back_to_now() {
        assert_eq!(import_date("not-a-date", noon()), "2024-02-29 12:00:00");
        assert_eq!(import_date("2023-05-01", noon()), "2024-02-29 12:00:00");
    }

    #[test]
    fn test_parse_stored_date_strips_zone_suffix() {
        let expected = NaiveDate::from_ymd_opt(2018, 1, 3)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(parse_stored_date("2018-01-03 08:30:00").unwrap(), expected);
        assert_eq!(
            parse_stored_date("2018-01-03 08:30:00 +0000 UTC").unwrap(),
            expected
        );
        assert_eq!(parse_stored_date("2018-01-03 08:30:00+00:00").unwrap(), expected);
    }

    #[test]
    fn test_parse_stored_date_rejects_garbage() {
        assert!(matches!(
            parse_stored_date("yesterday"),
            Err(IjahError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_parse_date_is_strict() {
        assert_eq!(format_date(&parse_date(" 2018-01-09 14:00:00 ").unwrap()), "2018-01-09 14:00:00");
        assert!(matches!(parse_date("2018-01-09"), Err(IjahError::InvalidDate(_))));
        assert!(matches!(
            parse_date("2018-01-09 14:00:00 +0000 UTC"),
            Err(IjahError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_parse_day() {
        assert_eq!(
            parse_day("2018-01-09").unwrap(),
            NaiveDate::from_ymd_opt(2018, 1, 9).unwrap()
        );
        assert!(matches!(parse_day("09/01/2018"), Err(IjahError::InvalidDate(_))));
    }

    #[test]
    fn test_import_currency() {
        assert_eq!(import_currency("Rp74,000"), "74000");
        assert_eq!(import_currency("Rp1,250,000"), "1250000");
        assert_eq!(import_currency("5000"), "5000");
    }

    #[test]
    fn test_split_order_reference() {
        assert_eq!(split_order_reference("Penjualan ORD123"), "ORD123");
        assert_eq!(split_order_reference("Single"), "");
        assert_eq!(split_order_reference("Pesanan ID-20180101-853630 dibatalkan"), "");
    }

    #[test]
    fn test_format_number_has_no_grouping() {
        assert_eq!(format_number(1_250_000), "1250000");
        assert_eq!(format_number(-15), "-15");
    }
}
