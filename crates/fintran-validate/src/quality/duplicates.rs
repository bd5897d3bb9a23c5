//! Duplicate detection over a tuple of key columns.

use std::collections::HashMap;

use fintran_common::string_values;
use fintran_model::ValidationResult;
use polars::prelude::{DataFrame, PolarsError};
use serde::Deserialize;

use crate::custom::{check_required_fields, column, truncated_indices};
use crate::error::ValidationError;
use crate::validator::{ConfiguredValidator, Validator};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateMode {
    #[default]
    Exact,
    /// Accepted but not implemented; validation reports it as unsupported.
    Fuzzy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DuplicateDetectionConfig {
    pub fields: Vec<String>,
    #[serde(default)]
    pub mode: DuplicateMode,
}

#[derive(Debug, Clone)]
pub struct DuplicateDetectionValidator {
    fields: Vec<String>,
    mode: DuplicateMode,
}

impl DuplicateDetectionValidator {
    pub fn new<S: AsRef<str>>(fields: &[S], mode: DuplicateMode) -> Result<Self, ValidationError> {
        Self::from_config(DuplicateDetectionConfig {
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
            mode,
        })
    }

    /// Every row whose key tuple occurs more than once, first occurrence included.
    fn duplicate_rows(keys: &[Vec<Option<String>>], height: usize) -> Vec<usize> {
        let tuple = |row: usize| {
            keys.iter()
                .map(|col| col[row].as_deref())
                .collect::<Vec<_>>()
        };
        let mut counts: HashMap<Vec<Option<&str>>, usize> = HashMap::new();
        for row in 0..height {
            *counts.entry(tuple(row)).or_default() += 1;
        }
        (0..height)
            .filter(|&row| counts.get(&tuple(row)).is_some_and(|&n| n > 1))
            .collect()
    }
}

impl ConfiguredValidator for DuplicateDetectionValidator {
    type Config = DuplicateDetectionConfig;
    const NAME: &'static str = "duplicate_detection";

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
            mode: config.mode,
        })
    }
}

impl Validator for DuplicateDetectionValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, df: &DataFrame) -> Result<ValidationResult, ValidationError> {
        let required: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        if let Some(failed) = check_required_fields(df, &required, Self::NAME) {
            return Ok(failed);
        }
        if self.mode == DuplicateMode::Fuzzy {
            return Ok(ValidationResult::fail(
                Self::NAME,
                "Fuzzy matching mode is not yet implemented",
            ));
        }

        let exec = |err: PolarsError| ValidationError::execution(Self::NAME, err);
        let keys = self
            .fields
            .iter()
            .map(|name| string_values(column(df, name, Self::NAME)?).map_err(exec))
            .collect::<Result<Vec<_>, _>>()?;
        let duplicates = Self::duplicate_rows(&keys, df.height());

        if duplicates.is_empty() {
            return Ok(ValidationResult::pass(Self::NAME).with_metadata("duplicate_count", 0));
        }
        let warning = format!(
            "Found {} duplicate transactions based on fields: {} (rows: {})",
            duplicates.len(),
            self.fields.join(", "),
            truncated_indices(&duplicates)
        );
        Ok(ValidationResult::new(Self::NAME, Vec::new(), vec![warning])
            .with_metadata("duplicate_count", duplicates.len())
            .with_metadata("duplicate_indices", duplicates)
            .with_metadata("fields_checked", self.fields.clone()))
    }
}
