//! Building blocks for writing validators.
//!
//! The built-in validators use these too, so custom rules report missing
//! columns and violations the same way.

use fintran_model::ValidationResult;
use polars::prelude::{Column, DataFrame, PolarsResult};
use regex::Regex;

use crate::error::ValidationError;

/// Returns a failing result naming every absent column, or `None` when all exist.
pub fn check_required_fields(
    df: &DataFrame,
    fields: &[&str],
    validator_name: &str,
) -> Option<ValidationResult> {
    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| df.column(field).is_err())
        .collect();
    match missing.as_slice() {
        [] => None,
        [field] => Some(ValidationResult::fail(
            validator_name,
            format!("Required field '{field}' not found in dataset (validator: {validator_name})"),
        )),
        fields => Some(ValidationResult::fail(
            validator_name,
            format!(
                "Required fields not found in dataset: {} (validator: {validator_name})",
                fields.join(", ")
            ),
        )),
    }
}

/// Fetches a column, turning absence into an execution error.
pub fn column<'a>(
    df: &'a DataFrame,
    field: &str,
    validator_name: &str,
) -> Result<&'a Column, ValidationError> {
    df.column(field).map_err(|_| {
        ValidationError::execution(
            validator_name,
            format!("required field '{field}' not found in dataset"),
        )
    })
}

/// Row indices whose string value matches any of `patterns` (search semantics).
pub fn rows_matching_patterns(column: &Column, patterns: &[Regex]) -> PolarsResult<Vec<usize>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }
    let values = fintran_common::string_values(column)?;
    Ok(values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| {
            let value = value.as_deref()?;
            patterns
                .iter()
                .any(|pattern| pattern.is_match(value))
                .then_some(idx)
        })
        .collect())
}

/// `Field 'amount' must be positive: -5 (row: 3, account: 4001)`
pub fn format_violation_error(
    row_index: usize,
    field: &str,
    value: &str,
    message: &str,
    extra: &[(&str, String)],
) -> String {
    let mut out = format!("Field '{field}' {message}: {value} (row: {row_index}");
    for (key, val) in extra {
        out.push_str(&format!(", {key}: {val}"));
    }
    out.push(')');
    out
}

/// `Group 'A1' has conflicting values in field 'currency': EUR, USD (rows: [0, 1])`
///
/// At most ten row indices are listed; a longer list ends in `...`.
pub fn format_group_error(
    group_key: &[String],
    field: &str,
    values: &[String],
    message: &str,
    row_indices: &[usize],
) -> String {
    let mut out = format!(
        "Group '{}' {message} in field '{field}': {}",
        group_key.join(", "),
        values.join(", ")
    );
    if !row_indices.is_empty() {
        out.push_str(&format!(" (rows: {})", truncated_indices(row_indices)));
    }
    out
}

/// `[0, 1, 2]`, or the first ten followed by `...`.
pub fn truncated_indices(indices: &[usize]) -> String {
    const SHOWN: usize = 10;
    let head = &indices[..indices.len().min(SHOWN)];
    let suffix = if indices.len() > SHOWN { "..." } else { "" };
    format!("{head:?}{suffix}")
}
