//! Inclusive date bounds.

use chrono::NaiveDate;
use fintran_common::date_values;
use fintran_model::ValidationResult;
use polars::prelude::{DataFrame, PolarsError};
use serde::Deserialize;
use serde_json::json;

use crate::custom::{check_required_fields, column};
use crate::error::ValidationError;
use crate::validator::{ConfiguredValidator, Validator};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateRangeConfig {
    #[serde(default)]
    pub min_date: Option<NaiveDate>,
    #[serde(default)]
    pub max_date: Option<NaiveDate>,
    #[serde(default = "default_field")]
    pub field: String,
}

fn default_field() -> String {
    "date".to_string()
}

#[derive(Debug, Clone)]
pub struct DateRangeValidator {
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
    field: String,
}

impl DateRangeValidator {
    pub fn new(
        min_date: Option<NaiveDate>,
        max_date: Option<NaiveDate>,
    ) -> Result<Self, ValidationError> {
        Self::from_config(DateRangeConfig {
            min_date,
            max_date,
            field: default_field(),
        })
    }

    fn describe(&self, row: usize, date: NaiveDate) -> Option<String> {
        if let Some(min) = self.min_date
            && date < min
        {
            return Some(format!(
                "Row {row}: Date {date} is before minimum date {min}"
            ));
        }
        if let Some(max) = self.max_date
            && date > max
        {
            return Some(format!("Row {row}: Date {date} is after maximum date {max}"));
        }
        None
    }
}

impl ConfiguredValidator for DateRangeValidator {
    type Config = DateRangeConfig;
    const NAME: &'static str = "date_range";

    fn from_config(config: Self::Config) -> Result<Self, ValidationError> {
        match (config.min_date, config.max_date) {
            (None, None) => {
                return Err(ValidationError::config(
                    Self::NAME,
                    "min_date",
                    "At least one of min_date or max_date must be specified",
                ));
            }
            (Some(min), Some(max)) if min > max => {
                return Err(ValidationError::config(
                    Self::NAME,
                    "min_date",
                    format!("min_date ({min}) must be <= max_date ({max})"),
                ));
            }
            _ => {}
        }
        Ok(Self {
            min_date: config.min_date,
            max_date: config.max_date,
            field: config.field,
        })
    }
}

impl Validator for DateRangeValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, df: &DataFrame) -> Result<ValidationResult, ValidationError> {
        if let Some(failed) = check_required_fields(df, &[self.field.as_str()], Self::NAME) {
            return Ok(failed);
        }
        let dates = date_values(column(df, &self.field, Self::NAME)?)
            .map_err(|err: PolarsError| ValidationError::execution(Self::NAME, err))?;

        let mut errors = Vec::new();
        let mut violations = Vec::new();
        for (row, date) in dates.iter().enumerate() {
            let Some(date) = *date else {
                continue;
            };
            let Some(message) = self.describe(row, date) else {
                continue;
            };
            errors.push(message);
            violations.push(json!({
                "row_index": row,
                "date": date.to_string(),
                "min_date": self.min_date.map(|d| d.to_string()),
                "max_date": self.max_date.map(|d| d.to_string()),
            }));
        }

        if errors.is_empty() {
            return Ok(ValidationResult::pass(Self::NAME));
        }
        let count = violations.len();
        Ok(ValidationResult::new(Self::NAME, errors, Vec::new())
            .with_metadata("violations", violations)
            .with_metadata("violation_count", count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{DataType, IntoColumn, NamedFrom, Series};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dated(days: &[Option<i32>]) -> DataFrame {
        DataFrame::new(vec![
            Series::new("date".into(), days)
                .cast(&DataType::Date)
                .unwrap()
                .into_column(),
        ])
        .unwrap()
    }

    #[test]
    fn flags_rows_outside_bounds() {
        // 2023-12-31, 2024-01-01, 2024-12-31, 2025-01-01, null
        let df = dated(&[Some(19_722), Some(19_723), Some(20_088), Some(20_089), None]);
        let validator =
            DateRangeValidator::new(Some(ymd(2024, 1, 1)), Some(ymd(2024, 12, 31))).unwrap();
        let result = validator.validate(&df).unwrap();
        assert_eq!(
            result.errors(),
            [
                "Row 0: Date 2023-12-31 is before minimum date 2024-01-01",
                "Row 3: Date 2025-01-01 is after maximum date 2024-12-31",
            ]
        );
        assert_eq!(result.metadata()["violation_count"], 2);
    }

    #[test]
    fn single_bound_is_enough() {
        let df = dated(&[Some(19_723)]);
        let validator = DateRangeValidator::new(None, Some(ymd(2023, 6, 30))).unwrap();
        let result = validator.validate(&df).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn accepts_iso_strings() {
        let df = DataFrame::new(vec![
            Series::new("date".into(), &["2024-02-01", "2024-03-01"]).into_column(),
        ])
        .unwrap();
        let validator = DateRangeValidator::new(Some(ymd(2024, 2, 15)), None).unwrap();
        let result = validator.validate(&df).unwrap();
        assert_eq!(
            result.errors(),
            ["Row 0: Date 2024-02-01 is before minimum date 2024-02-15"]
        );
    }

    #[test]
    fn rejects_bad_bounds() {
        assert!(DateRangeValidator::new(None, None).is_err());
        let err =
            DateRangeValidator::new(Some(ymd(2024, 2, 1)), Some(ymd(2024, 1, 1))).unwrap_err();
        assert!(err.to_string().contains("must be <= max_date"));
    }

    #[test]
    fn config_parses_iso_dates() {
        let config: DateRangeConfig =
            serde_json::from_str(r#"{"min_date": "2024-01-01"}"#).unwrap();
        assert_eq!(config.min_date, Some(ymd(2024, 1, 1)));
        assert_eq!(config.field, "date");
    }
}
