//! Parse-or-absent handling for optional export columns.
//!
//! Every optional column goes through [`parse_or_absent`]: blank or
//! placeholder text means "no data", unparseable text is logged and also
//! treated as "no data". Callers never see a sentinel value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::error::FieldError;

/// Placeholders written by upstream exporters in place of a missing value.
const ABSENT_MARKERS: &[&str] = &["", "none", "null", "nan", "n/a", "-"];

/// A type that can be read from a single CSV cell.
pub trait FieldValue: Sized {
    fn parse_field(field: &'static str, raw: &str) -> Result<Self, FieldError>;
}

impl FieldValue for f64 {
    fn parse_field(field: &'static str, raw: &str) -> Result<Self, FieldError> {
        let value: f64 = raw.parse().map_err(|_| FieldError::Malformed {
            field,
            value: raw.to_string(),
        })?;
        if !value.is_finite() {
            return Err(FieldError::NonFinite { field });
        }
        Ok(value)
    }
}

impl FieldValue for i32 {
    /// Accepts integral floats such as `"2023.0"`, which spreadsheet
    /// round-trips produce for year columns.
    fn parse_field(field: &'static str, raw: &str) -> Result<Self, FieldError> {
        if let Ok(v) = raw.parse::<i32>() {
            return Ok(v);
        }
        let value = f64::parse_field(field, raw)?;
        if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
            return Err(FieldError::Malformed {
                field,
                value: raw.to_string(),
            });
        }
        Ok(value as i32)
    }
}

impl FieldValue for u32 {
    fn parse_field(field: &'static str, raw: &str) -> Result<Self, FieldError> {
        let value = i32::parse_field(field, raw)?;
        u32::try_from(value).map_err(|_| FieldError::OutOfRange {
            field,
            value: raw.to_string(),
        })
    }
}

impl FieldValue for DateTime<Utc> {
    fn parse_field(field: &'static str, raw: &str) -> Result<Self, FieldError> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(naive.and_utc());
            }
        }
        Err(FieldError::Malformed {
            field,
            value: raw.to_string(),
        })
    }
}

/// Returns `Ok(None)` for a missing or placeholder cell, the parsed value
/// for a valid one, and the error for anything else.
pub fn try_parse<T: FieldValue>(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, FieldError> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if ABSENT_MARKERS.iter().any(|m| raw.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    T::parse_field(field, raw).map(Some)
}

/// Parses an optional cell, logging and discarding malformed values.
pub fn parse_or_absent<T: FieldValue>(field: &'static str, raw: Option<&str>) -> Option<T> {
    match try_parse(field, raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(field, error = %e, "Malformed field treated as absent");
            None
        }
    }
}

/// Decodes a raw cell as UTF-8. Returns the error for bytes in any other
/// encoding.
pub fn try_decode<'a>(field: &'static str, raw: &'a [u8]) -> Result<&'a str, FieldError> {
    std::str::from_utf8(raw).map_err(|_| FieldError::Encoding {
        field,
        value: String::from_utf8_lossy(raw).into_owned(),
    })
}

/// Decodes an optional raw cell, logging and discarding undecodable bytes.
pub fn decode_or_absent<'a>(field: &'static str, raw: Option<&'a [u8]>) -> Option<&'a str> {
    match try_decode(field, raw?) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(field, error = %e, "Malformed field treated as absent");
            None
        }
    }
}

/// Trims a text cell, mapping blank to `None`.
pub fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
