//! Polars AnyValue and column utility functions.
//!
//! This module provides helper functions for working with Polars `AnyValue` types
//! and for pulling whole columns out as plain Rust vectors, so the validators can
//! iterate rows positionally without caring about the physical column type.

use chrono::{Datelike, NaiveDate};
use polars::prelude::{AnyValue, Column, DataType, PolarsError, PolarsResult};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Converts a Polars `AnyValue` to a `String` representation.
///
/// Returns an empty string for `Null`, formats floats without trailing zeros
/// and renders dates as ISO `YYYY-MM-DD`.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use fintran_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
/// assert_eq!(any_to_string(AnyValue::String("USD")), "USD");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        AnyValue::Date(days) => {
            days_to_date(days).map_or_else(|| days.to_string(), |d| d.to_string())
        }
        other => other.to_string(),
    }
}

/// Formats a floating-point number as a string without trailing zeros.
///
/// # Examples
///
/// ```
/// use fintran_common::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(0.0), "0");
/// ```
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Converts an `AnyValue` to `f64`, returning `None` for non-numeric or null values.
///
/// Handles integer types, floating-point types, and string parsing.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        _ => None,
    }
}

/// Converts an `AnyValue` to a calendar date.
///
/// Accepts physical `Date` values and ISO `YYYY-MM-DD` strings.
pub fn any_to_date(value: AnyValue<'_>) -> Option<NaiveDate> {
    match value {
        AnyValue::Date(days) => days_to_date(days),
        AnyValue::String(s) => parse_date(s),
        AnyValue::StringOwned(s) => parse_date(&s),
        _ => None,
    }
}

/// Parses a string as `f64`, returning `None` for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parses an ISO `YYYY-MM-DD` date, returning `None` for invalid or empty strings.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// Days since the Unix epoch, the physical representation of a Polars `Date`.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal(..)
    )
}

fn type_error(column: &Column, expected: &str) -> PolarsError {
    PolarsError::InvalidOperation(
        format!(
            "column '{}' has type {}, expected {expected}",
            column.name(),
            column.dtype()
        )
        .into(),
    )
}

/// Reads every row of a column as an optional string.
///
/// Nulls become `None`; every other value goes through [`any_to_string`].
pub fn string_values(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let mut out = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        match column.get(idx)? {
            AnyValue::Null => out.push(None),
            value => out.push(Some(any_to_string(value))),
        }
    }
    Ok(out)
}

/// Reads every row of a numeric column as an optional `f64`.
///
/// Integer, float and decimal columns are cast; string columns are parsed and
/// any non-empty value that does not parse is an error. An all-null column
/// yields all `None`.
pub fn numeric_values(column: &Column) -> PolarsResult<Vec<Option<f64>>> {
    let dtype = column.dtype();
    if is_numeric_dtype(dtype) {
        let cast = column.cast(&DataType::Float64)?;
        let values = cast.as_materialized_series().f64()?;
        return Ok(values.into_iter().collect());
    }
    match dtype {
        DataType::Null => Ok(vec![None; column.len()]),
        DataType::String => {
            let values = column.as_materialized_series().str()?;
            values
                .into_iter()
                .map(|value| match value {
                    None => Ok(None),
                    Some(raw) if raw.trim().is_empty() => Ok(None),
                    Some(raw) => parse_f64(raw).map(Some).ok_or_else(|| {
                        PolarsError::ComputeError(
                            format!("column '{}' has non-numeric value '{raw}'", column.name())
                                .into(),
                        )
                    }),
                })
                .collect()
        }
        _ => Err(type_error(column, "a numeric type")),
    }
}

/// Reads every row of a date column as an optional [`NaiveDate`].
///
/// `Date` columns are read directly and `String` columns are parsed as ISO
/// dates; a non-empty string that does not parse is an error.
pub fn date_values(column: &Column) -> PolarsResult<Vec<Option<NaiveDate>>> {
    match column.dtype() {
        DataType::Null => Ok(vec![None; column.len()]),
        DataType::Date | DataType::String => {
            let mut out = Vec::with_capacity(column.len());
            for idx in 0..column.len() {
                let value = column.get(idx)?;
                let raw = match &value {
                    AnyValue::String(s) => Some(s.to_string()),
                    AnyValue::StringOwned(s) => Some(s.to_string()),
                    _ => None,
                };
                match (any_to_date(value), raw) {
                    (Some(date), _) => out.push(Some(date)),
                    (None, Some(raw)) if !raw.trim().is_empty() => {
                        return Err(PolarsError::ComputeError(
                            format!("column '{}' has invalid date '{raw}'", column.name()).into(),
                        ));
                    }
                    (None, _) => out.push(None),
                }
            }
            Ok(out)
        }
        _ => Err(type_error(column, "Date")),
    }
}

/// Counts missing values in a column.
///
/// Nulls always count; for string columns empty strings count as well.
pub fn missing_count(column: &Column) -> PolarsResult<usize> {
    let mut count = column.null_count();
    if column.dtype() == &DataType::String {
        let values = column.as_materialized_series().str()?;
        count += values.into_iter().flatten().filter(|v| v.is_empty()).count();
    }
    Ok(count)
}
