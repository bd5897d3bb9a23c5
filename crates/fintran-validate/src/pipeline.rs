//! Sequential validation engine.

use std::fmt;
use std::time::Instant;

use fintran_model::{ValidationReport, ValidationResult};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ValidationError;
use crate::validator::Validator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Stop after the first result that has errors.
    FailFast,
    /// Run every validator regardless of earlier outcomes.
    #[default]
    Continue,
}

impl ValidationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FailFast => "fail_fast",
            Self::Continue => "continue",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered, immutable list of validators plus an execution mode.
///
/// Validators run one after another in declared order so reports are
/// reproducible. Each [`run`](Self::run) produces an independent report.
pub struct ValidationPipeline {
    validators: Vec<Box<dyn Validator>>,
    mode: ValidationMode,
}

impl fmt::Debug for ValidationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("validators", &self.validator_names())
            .field("mode", &self.mode)
            .finish()
    }
}

impl ValidationPipeline {
    pub fn new(validators: Vec<Box<dyn Validator>>, mode: ValidationMode) -> Self {
        Self { validators, mode }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn validator_names(&self) -> Vec<&str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Runs the validators against `df` and folds their results into a report.
    ///
    /// A validator that cannot execute aborts the run with its error; data
    /// findings never do.
    pub fn run(&self, df: &DataFrame) -> Result<ValidationReport, ValidationError> {
        if self.validators.is_empty() {
            return Ok(ValidationReport::from_results(Vec::new()));
        }

        let started = Instant::now();
        let mut results: Vec<ValidationResult> = Vec::with_capacity(self.validators.len());
        for validator in &self.validators {
            let validator_start = Instant::now();
            let result = validator.validate(df)?;
            debug!(
                validator = validator.name(),
                is_valid = result.is_valid(),
                errors = result.errors().len(),
                warnings = result.warnings().len(),
                duration_ms = validator_start.elapsed().as_millis(),
                "validator finished"
            );
            let stop = self.mode == ValidationMode::FailFast && result.has_errors();
            results.push(result);
            if stop {
                debug!(
                    skipped = self.validators.len() - results.len(),
                    "fail-fast stop"
                );
                break;
            }
        }

        let report = ValidationReport::from_results(results);
        info!(
            mode = %self.mode,
            total = report.total(),
            passed = report.passed(),
            failed = report.failed(),
            warnings = report.warnings_count(),
            duration_ms = started.elapsed().as_millis(),
            "validation run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::FnValidator;

    fn passing(name: &'static str) -> Box<dyn Validator> {
        Box::new(FnValidator::new(name, move |_df: &DataFrame| {
            Ok(ValidationResult::pass(name))
        }))
    }

    fn failing(name: &'static str) -> Box<dyn Validator> {
        Box::new(FnValidator::new(name, move |_df: &DataFrame| {
            Ok(ValidationResult::fail(name, "bad data"))
        }))
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let pipeline = ValidationPipeline::new(Vec::new(), ValidationMode::FailFast);
        let report = pipeline.run(&DataFrame::empty()).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.total(), 0);
        assert_eq!(report.warnings_count(), 0);
    }

    #[test]
    fn fail_fast_stops_after_first_failure() {
        let pipeline = ValidationPipeline::new(
            vec![failing("fail"), passing("pass")],
            ValidationMode::FailFast,
        );
        let report = pipeline.run(&DataFrame::empty()).unwrap();
        assert_eq!(report.total(), 1);
        assert_eq!(report.results()[0].validator_name(), "fail");
    }

    #[test]
    fn continue_runs_everything() {
        let pipeline = ValidationPipeline::new(
            vec![failing("fail"), passing("pass")],
            ValidationMode::Continue,
        );
        let report = pipeline.run(&DataFrame::empty()).unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.passed(), 1);
    }

    #[test]
    fn warnings_do_not_trigger_fail_fast() {
        let warn: Box<dyn Validator> = Box::new(FnValidator::new("warn", |_df: &DataFrame| {
            Ok(ValidationResult::new("warn", vec![], vec!["hmm".into()]))
        }));
        let pipeline =
            ValidationPipeline::new(vec![warn, passing("pass")], ValidationMode::FailFast);
        let report = pipeline.run(&DataFrame::empty()).unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(report.warnings_count(), 1);
    }

    #[test]
    fn execution_errors_abort_the_run() {
        let broken: Box<dyn Validator> = Box::new(FnValidator::new("broken", |_df: &DataFrame| {
            Err(ValidationError::execution("broken", "column vanished"))
        }));
        let pipeline = ValidationPipeline::new(vec![broken], ValidationMode::Continue);
        let err = pipeline.run(&DataFrame::empty()).unwrap_err();
        assert!(matches!(err, ValidationError::Execution { .. }));
    }

    #[test]
    fn mode_names() {
        assert_eq!(ValidationMode::FailFast.to_string(), "fail_fast");
        assert_eq!(ValidationMode::default(), ValidationMode::Continue);
    }
}
