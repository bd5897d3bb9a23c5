//! Shared utilities for fintran crates.
//!
//! This crate provides the Polars column helpers and the small set of
//! descriptive statistics the validators rely on.

pub mod polars;
pub mod stats;

pub use polars::{
    any_to_date, any_to_f64, any_to_string, date_to_days, date_values, format_numeric,
    missing_count, numeric_values, parse_date, parse_f64, string_values,
};
pub use stats::{mean, population_std, quantile};
