//! Missing-value detection. Nulls count everywhere, empty strings count in text columns.

use fintran_common::missing_count;
use fintran_model::ValidationResult;
use polars::prelude::DataFrame;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::custom::{check_required_fields, column};
use crate::error::ValidationError;
use crate::validator::{ConfiguredValidator, Validator};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissingValueDetectionConfig {
    pub fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MissingValueDetectionValidator {
    fields: Vec<String>,
}

impl MissingValueDetectionValidator {
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Result<Self, ValidationError> {
        Self::from_config(MissingValueDetectionConfig {
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
        })
    }
}

impl ConfiguredValidator for MissingValueDetectionValidator {
    type Config = MissingValueDetectionConfig;
    const NAME: &'static str = "missing_value_detection";

    fn from_config(config: Self::Config) -> Result<Self, ValidationError> {
        if config.fields.is_empty() {
            return Err(ValidationError::config(
                Self::NAME,
                "fields",
                "fields parameter must contain at least one field name",
            ));
        }
        Ok(Self {
            fields: config.fields,
        })
    }
}

impl Validator for MissingValueDetectionValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, df: &DataFrame) -> Result<ValidationResult, ValidationError> {
        let required: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        if let Some(failed) = check_required_fields(df, &required, Self::NAME) {
            return Ok(failed);
        }
        let total_rows = df.height();
        if total_rows == 0 {
            return Ok(ValidationResult::pass(Self::NAME).with_metadata("total_rows", 0));
        }

        let mut warnings = Vec::new();
        let mut checked = Map::new();
        for field in &self.fields {
            let missing = missing_count(column(df, field, Self::NAME)?)
                .map_err(|err| ValidationError::execution(Self::NAME, err))?;
            let percentage = missing as f64 / total_rows as f64 * 100.0;
            if missing > 0 {
                warnings.push(format!(
                    "Field '{field}' has {missing} missing values ({percentage:.1}% of {total_rows} rows)"
                ));
            }
            checked.insert(
                field.clone(),
                json!({ "missing_count": missing, "percentage": percentage }),
            );
        }

        Ok(ValidationResult::new(Self::NAME, Vec::new(), warnings)
            .with_metadata("total_rows", total_rows)
            .with_metadata("fields_checked", Value::Object(checked)))
    }
}
