//! Statistical outlier detection on a numeric column.
//!
//! Nulls are ignored. With fewer than two non-null values there is no
//! distribution to measure and the check passes. A zero spread (standard
//! deviation or IQR) also passes trivially.

use std::fmt;

use fintran_common::{mean, numeric_values, population_std, quantile};
use fintran_model::{Metadata, ValidationResult};
use polars::prelude::DataFrame;
use serde::Deserialize;
use serde_json::Value;

use super::MAX_LISTED;
use crate::custom::{check_required_fields, column};
use crate::error::ValidationError;
use crate::validator::{ConfiguredValidator, Validator};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    #[default]
    #[serde(alias = "z-score", alias = "z_score")]
    Zscore,
    Iqr,
    Percentile,
}

impl OutlierMethod {
    pub fn default_threshold(self) -> f64 {
        match self {
            Self::Zscore => 3.0,
            Self::Iqr => 1.5,
            Self::Percentile => 5.0,
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zscore => "zscore",
            Self::Iqr => "iqr",
            Self::Percentile => "percentile",
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutlierDetectionConfig {
    #[serde(default)]
    pub method: OutlierMethod,
    /// Defaults per method: 3.0 (z-score), 1.5 (IQR), 5.0 (percentile).
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default = "default_field")]
    pub field: String,
}

fn default_field() -> String {
    "amount".to_string()
}

#[derive(Debug, Clone)]
pub struct OutlierDetectionValidator {
    method: OutlierMethod,
    threshold: f64,
    field: String,
}

/// Flagged rows plus the method's statistics.
struct Detection {
    outliers: Vec<(usize, f64, Option<f64>)>,
    stats: Metadata,
    summary: String,
}

impl OutlierDetectionValidator {
    pub fn new(method: OutlierMethod, threshold: Option<f64>) -> Result<Self, ValidationError> {
        Self::from_config(OutlierDetectionConfig {
            method,
            threshold,
            field: default_field(),
        })
    }

    fn base_metadata(&self) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert("method".into(), Value::from(self.method.to_string()));
        meta.insert("threshold".into(), Value::from(self.threshold));
        meta
    }

    fn zscore(&self, values: &[(usize, f64)], raw: &[f64]) -> Option<Detection> {
        let avg = mean(raw)?;
        let std = population_std(raw)?;
        let mut stats = Metadata::new();
        stats.insert("mean".into(), Value::from(avg));
        stats.insert("std".into(), Value::from(std));
        let outliers = if std == 0.0 {
            Vec::new()
        } else {
            values
                .iter()
                .filter_map(|&(row, v)| {
                    let z = ((v - avg) / std).abs();
                    (z > self.threshold).then_some((row, v, Some(z)))
                })
                .collect()
        };
        Some(Detection {
            summary: format!("threshold={:?}", self.threshold),
            outliers,
            stats,
        })
    }

    fn iqr(&self, values: &[(usize, f64)], raw: &[f64]) -> Option<Detection> {
        let q1 = quantile(raw, 0.25)?;
        let q3 = quantile(raw, 0.75)?;
        let iqr = q3 - q1;
        let lower = q1 - self.threshold * iqr;
        let upper = q3 + self.threshold * iqr;
        let mut stats = Metadata::new();
        stats.insert("q1".into(), Value::from(q1));
        stats.insert("q3".into(), Value::from(q3));
        stats.insert("iqr".into(), Value::from(iqr));
        let outliers = if iqr == 0.0 {
            Vec::new()
        } else {
            stats.insert("lower_bound".into(), Value::from(lower));
            stats.insert("upper_bound".into(), Value::from(upper));
            outside(values, lower, upper)
        };
        Some(Detection {
            summary: format!("threshold={:?}", self.threshold),
            outliers,
            stats,
        })
    }

    fn percentile(&self, values: &[(usize, f64)], raw: &[f64]) -> Option<Detection> {
        let lower_pct = self.threshold / 2.0;
        let upper_pct = 100.0 - lower_pct;
        let lower = quantile(raw, lower_pct / 100.0)?;
        let upper = quantile(raw, upper_pct / 100.0)?;
        let mut stats = Metadata::new();
        stats.insert("lower_percentile".into(), Value::from(lower_pct));
        stats.insert("upper_percentile".into(), Value::from(upper_pct));
        stats.insert("lower_bound".into(), Value::from(lower));
        stats.insert("upper_bound".into(), Value::from(upper));
        Some(Detection {
            summary: format!(
                "threshold={:?}, outside {lower_pct:.1}th-{upper_pct:.1}th percentile range",
                self.threshold
            ),
            outliers: outside(values, lower, upper),
            stats,
        })
    }
}

fn outside(values: &[(usize, f64)], lower: f64, upper: f64) -> Vec<(usize, f64, Option<f64>)> {
    values
        .iter()
        .filter(|&&(_, v)| v < lower || v > upper)
        .map(|&(row, v)| (row, v, None))
        .collect()
}

impl ConfiguredValidator for OutlierDetectionValidator {
    type Config = OutlierDetectionConfig;
    const NAME: &'static str = "outlier_detection";

    fn from_config(config: Self::Config) -> Result<Self, ValidationError> {
        let threshold = config
            .threshold
            .unwrap_or_else(|| config.method.default_threshold());
        let valid = match config.method {
            OutlierMethod::Zscore | OutlierMethod::Iqr => threshold.is_finite() && threshold > 0.0,
            OutlierMethod::Percentile => (0.0..=100.0).contains(&threshold),
        };
        if !valid {
            let rule = match config.method {
                OutlierMethod::Percentile => "percentile threshold must be between 0 and 100",
                _ => "threshold must be positive",
            };
            return Err(ValidationError::config(
                Self::NAME,
                "threshold",
                format!("{rule}, got: {threshold}"),
            ));
        }
        Ok(Self {
            method: config.method,
            threshold,
            field: config.field,
        })
    }
}

impl Validator for OutlierDetectionValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, df: &DataFrame) -> Result<ValidationResult, ValidationError> {
        if let Some(failed) = check_required_fields(df, &[self.field.as_str()], Self::NAME) {
            return Ok(failed);
        }
        let values: Vec<(usize, f64)> = numeric_values(column(df, &self.field, Self::NAME)?)
            .map_err(|err| ValidationError::execution(Self::NAME, err))?
            .into_iter()
            .enumerate()
            .filter_map(|(row, v)| v.filter(|v| !v.is_nan()).map(|v| (row, v)))
            .collect();
        let raw: Vec<f64> = values.iter().map(|&(_, v)| v).collect();

        let detection = if raw.len() < 2 {
            None
        } else {
            match self.method {
                OutlierMethod::Zscore => self.zscore(&values, &raw),
                OutlierMethod::Iqr => self.iqr(&values, &raw),
                OutlierMethod::Percentile => self.percentile(&values, &raw),
            }
        };
        let Some(detection) = detection else {
            return Ok(ValidationResult::pass(Self::NAME)
                .with_metadata_map(self.base_metadata())
                .with_metadata("total_rows", df.height())
                .with_metadata("outlier_count", 0));
        };

        let mut meta = self.base_metadata();
        meta.extend(detection.stats);
        let outliers = detection.outliers;
        meta.insert("outlier_count".into(), Value::from(outliers.len()));
        if outliers.is_empty() {
            return Ok(ValidationResult::pass(Self::NAME).with_metadata_map(meta));
        }

        let mut warnings = vec![format!(
            "Found {} outlier values in '{}' using {} method ({})",
            outliers.len(),
            self.field,
            self.method,
            detection.summary
        )];
        for &(row, value, z) in outliers.iter().take(MAX_LISTED) {
            let line = match z {
                Some(z) => format!("Row {row}: {}={value:.2} (z-score={z:.2})", self.field),
                None => format!("Row {row}: {}={value:.2}", self.field),
            };
            warnings.push(line);
        }
        if outliers.len() > MAX_LISTED {
            warnings.push(format!(
                "... and {} more outliers",
                outliers.len() - MAX_LISTED
            ));
        }
        let indices: Vec<usize> = outliers.iter().map(|&(row, _, _)| row).collect();
        meta.insert("outlier_indices".into(), Value::from(indices));
        Ok(ValidationResult::new(Self::NAME, Vec::new(), warnings).with_metadata_map(meta))
    }
}
