//! Sign constraint: amounts on matching accounts must be strictly positive.

use fintran_common::{numeric_values, string_values};
use fintran_model::ValidationResult;
use polars::prelude::{DataFrame, PolarsError};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::custom::{check_required_fields, column, rows_matching_patterns};
use crate::error::ValidationError;
use crate::validator::{ConfiguredValidator, Validator};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositiveAmountsConfig {
    pub account_patterns: Vec<String>,
    #[serde(default = "default_account_field")]
    pub account_field: String,
    #[serde(default = "default_amount_field")]
    pub amount_field: String,
}

fn default_account_field() -> String {
    "account".to_string()
}

fn default_amount_field() -> String {
    "amount".to_string()
}

#[derive(Debug, Clone)]
pub struct PositiveAmountsValidator {
    patterns: Vec<Regex>,
    account_field: String,
    amount_field: String,
}

impl PositiveAmountsValidator {
    pub fn new<S: AsRef<str>>(account_patterns: &[S]) -> Result<Self, ValidationError> {
        Self::from_config(PositiveAmountsConfig {
            account_patterns: account_patterns
                .iter()
                .map(|p| p.as_ref().to_string())
                .collect(),
            account_field: default_account_field(),
            amount_field: default_amount_field(),
        })
    }
}

impl ConfiguredValidator for PositiveAmountsValidator {
    type Config = PositiveAmountsConfig;
    const NAME: &'static str = "positive_amounts";

    fn from_config(config: Self::Config) -> Result<Self, ValidationError> {
        if config.account_patterns.is_empty() {
            return Err(ValidationError::config(
                Self::NAME,
                "account_patterns",
                "account_patterns must contain at least one pattern",
            ));
        }
        let patterns = config
            .account_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|err| {
                    ValidationError::config(
                        Self::NAME,
                        "account_patterns",
                        format!("invalid pattern '{pattern}': {err}"),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            account_field: config.account_field,
            amount_field: config.amount_field,
        })
    }
}

impl Validator for PositiveAmountsValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, df: &DataFrame) -> Result<ValidationResult, ValidationError> {
        let required = [self.account_field.as_str(), self.amount_field.as_str()];
        if let Some(failed) = check_required_fields(df, &required, Self::NAME) {
            return Ok(failed);
        }
        let exec = |err: PolarsError| ValidationError::execution(Self::NAME, err);
        let account_column = column(df, &self.account_field, Self::NAME)?;
        let matched = rows_matching_patterns(account_column, &self.patterns).map_err(exec)?;
        if matched.is_empty() {
            return Ok(ValidationResult::pass(Self::NAME));
        }
        let accounts = string_values(account_column).map_err(exec)?;
        let amounts =
            numeric_values(column(df, &self.amount_field, Self::NAME)?).map_err(exec)?;

        let mut errors = Vec::new();
        let mut violations = Vec::new();
        for idx in matched {
            let Some(amount) = amounts[idx] else {
                continue;
            };
            if amount > 0.0 {
                continue;
            }
            let account = accounts[idx].as_deref().unwrap_or_default();
            errors.push(format!(
                "Account {account} has non-positive amount {amount:.2} (row: {idx})"
            ));
            violations.push(json!({
                "row_index": idx,
                "account": account,
                "amount": amount,
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
