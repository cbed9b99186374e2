//! Field extraction utilities for Arrow record batches
//!
//! Typed values are parsed out of string columns. Anything that does not
//! parse becomes `None`; extraction never fails.

use arrow::array::{Array, StringArray};
use chrono::{NaiveDate, NaiveDateTime};

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Extract a trimmed string value from a string column
///
/// # Returns
///
/// * `Some(String)` - The value, with surrounding whitespace removed
/// * `None` - If the value is null, out of range or empty
#[must_use]
pub fn extract_string(column: &StringArray, row: usize) -> Option<String> {
    raw_value(column, row).map(str::to_string)
}

/// Extract an integer value, accepting float notation such as `"123.0"`
///
/// Float values are truncated toward zero; non-finite values yield `None`.
#[must_use]
pub fn extract_i64(column: &StringArray, row: usize) -> Option<i64> {
    let value = raw_value(column, row)?;
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(|number| number.trunc() as i64)
    })
}

/// Extract a timestamp value; date-only values are taken at midnight
#[must_use]
pub fn extract_timestamp(column: &StringArray, row: usize) -> Option<NaiveDateTime> {
    raw_value(column, row).and_then(parse_timestamp)
}

/// Extract a calendar date; timestamp values are truncated to their date
#[must_use]
pub fn extract_date(column: &StringArray, row: usize) -> Option<NaiveDate> {
    raw_value(column, row).and_then(parse_date)
}

/// Parse a timestamp in one of the formats found in the source tables
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parse a date, accepting full timestamps as well
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(value).map(|timestamp| timestamp.date()))
}

fn raw_value(column: &StringArray, row: usize) -> Option<&str> {
    if row >= column.len() || column.is_null(row) {
        return None;
    }
    let value = column.value(row).trim();
    (!value.is_empty()).then_some(value)
}
