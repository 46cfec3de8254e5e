//! Date-only arithmetic helpers.
//!
//! All calendar math works on `NaiveDate`, so there is no time-of-day or
//! timezone to strip before counting days.

use crate::{Error, Result};
use chrono::NaiveDate;

/// Format used for every persisted and displayed date
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Signed number of days from `a` to `b`
///
/// Negative when `b` precedes `a`.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

/// Parse a strict `YYYY-MM-DD` calendar date
///
/// Only four-digit years are accepted; chrono's `%Y` alone would also take
/// signed extended years such as `+262142-12-30`.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    if !is_iso_date_shape(trimmed) {
        return Err(Error::DateParse(trimmed.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT)
        .map_err(|_| Error::DateParse(trimmed.to_string()))
}

fn is_iso_date_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
