//! Grouped consistency: one distinct currency per group.
//!
//! Null is treated as its own value (rendered `NULL`), so a group mixing null
//! and non-null currencies is a violation. Null grouping keys form their own
//! group.

use std::collections::{BTreeMap, BTreeSet};

use fintran_common::string_values;
use fintran_model::ValidationResult;
use polars::prelude::{DataFrame, PolarsError};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::custom::{check_required_fields, column};
use crate::error::ValidationError;
use crate::validator::{ConfiguredValidator, Validator};

const NULL_LABEL: &str = "NULL";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurrencyConsistencyConfig {
    /// Grouping columns. An explicit `null` checks the whole dataset as one group.
    #[serde(default = "default_group_by")]
    pub group_by: Option<Vec<String>>,
    #[serde(default = "default_field")]
    pub field: String,
}

fn default_group_by() -> Option<Vec<String>> {
    Some(vec!["account".to_string()])
}

fn default_field() -> String {
    "currency".to_string()
}

#[derive(Debug, Clone)]
pub struct CurrencyConsistencyValidator {
    group_by: Option<Vec<String>>,
    field: String,
}

impl CurrencyConsistencyValidator {
    /// Groups by `account`.
    pub fn by_account() -> Self {
        Self {
            group_by: default_group_by(),
            field: default_field(),
        }
    }

    pub fn grouped_by<S: AsRef<str>>(fields: &[S]) -> Result<Self, ValidationError> {
        Self::from_config(CurrencyConsistencyConfig {
            group_by: Some(fields.iter().map(|f| f.as_ref().to_string()).collect()),
            field: default_field(),
        })
    }

    /// Treats the entire dataset as a single group.
    pub fn whole_dataset() -> Self {
        Self {
            group_by: None,
            field: default_field(),
        }
    }

    fn label(value: Option<&str>) -> String {
        value.unwrap_or(NULL_LABEL).to_string()
    }

    fn sorted_labels(values: &BTreeSet<Option<String>>) -> Vec<String> {
        let mut labels: Vec<String> = values.iter().map(|v| Self::label(v.as_deref())).collect();
        labels.sort();
        labels
    }

    fn validate_whole(&self, currencies: &[Option<String>]) -> ValidationResult {
        let distinct: BTreeSet<Option<String>> = currencies.iter().cloned().collect();
        if distinct.len() <= 1 {
            return ValidationResult::pass(Self::NAME);
        }
        let labels = Self::sorted_labels(&distinct);
        let error = format!(
            "Dataset has multiple currencies: {} ({} distinct currencies)",
            labels.join(", "),
            labels.len()
        );
        ValidationResult::fail(Self::NAME, error)
            .with_metadata("currencies", labels.clone())
            .with_metadata("currency_count", labels.len())
    }

    fn validate_groups(
        &self,
        group_by: &[String],
        keys: &[Vec<Option<String>>],
        currencies: &[Option<String>],
    ) -> ValidationResult {
        let mut groups: BTreeMap<Vec<Option<String>>, BTreeSet<Option<String>>> = BTreeMap::new();
        for (row, currency) in currencies.iter().enumerate() {
            let key: Vec<Option<String>> = keys.iter().map(|col| col[row].clone()).collect();
            groups.entry(key).or_default().insert(currency.clone());
        }

        let mut errors = Vec::new();
        let mut violations = Vec::new();
        for (key, distinct) in &groups {
            if distinct.len() <= 1 {
                continue;
            }
            let labels = Self::sorted_labels(distinct);
            let group_id = group_by
                .iter()
                .zip(key)
                .map(|(name, value)| format!("{name}={}", Self::label(value.as_deref())))
                .collect::<Vec<_>>()
                .join(", ");
            errors.push(format!(
                "Group ({group_id}) has multiple currencies: {} ({} distinct currencies)",
                labels.join(", "),
                labels.len()
            ));
            let group: Map<String, Value> = group_by
                .iter()
                .zip(key)
                .map(|(name, value)| (name.clone(), json!(value)))
                .collect();
            violations.push(json!({
                "group": group,
                "currencies": labels,
                "currency_count": distinct.len(),
            }));
        }

        if errors.is_empty() {
            return ValidationResult::pass(Self::NAME);
        }
        let count = violations.len();
        ValidationResult::new(Self::NAME, errors, Vec::new())
            .with_metadata("violations", violations)
            .with_metadata("groups_with_violations", count)
    }
}

impl ConfiguredValidator for CurrencyConsistencyValidator {
    type Config = CurrencyConsistencyConfig;
    const NAME: &'static str = "currency_consistency";

    fn from_config(config: Self::Config) -> Result<Self, ValidationError> {
        if config.group_by.as_ref().is_some_and(Vec::is_empty) {
            return Err(ValidationError::config(
                Self::NAME,
                "group_by",
                "group_by must contain at least one field or be null",
            ));
        }
        Ok(Self {
            group_by: config.group_by,
            field: config.field,
        })
    }
}

impl Validator for CurrencyConsistencyValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, df: &DataFrame) -> Result<ValidationResult, ValidationError> {
        let mut required = vec![self.field.as_str()];
        if let Some(group_by) = &self.group_by {
            required.extend(group_by.iter().map(String::as_str));
        }
        if let Some(failed) = check_required_fields(df, &required, Self::NAME) {
            return Ok(failed);
        }

        let exec = |err: PolarsError| ValidationError::execution(Self::NAME, err);
        let currencies = string_values(column(df, &self.field, Self::NAME)?).map_err(exec)?;
        let Some(group_by) = &self.group_by else {
            return Ok(self.validate_whole(&currencies));
        };
        let keys = group_by
            .iter()
            .map(|name| string_values(column(df, name, Self::NAME)?).map_err(exec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.validate_groups(group_by, &keys, &currencies))
    }
}
