//! Validation as a pipeline transform.

use fintran_model::{FintranError, IrFrame, Result, Transform, ValidationReport};
use tracing::{info, warn};

use crate::pipeline::ValidationPipeline;

pub const DEFAULT_REPORT_KEY: &str = "validation_report";

/// Wraps a [`ValidationPipeline`] in the [`Transform`] contract.
///
/// The data passes through unchanged. The report is appended to the frame's
/// metadata under [`metadata_key`](Self::metadata_key), or, with
/// `fail_on_error`, an invalid report aborts the conversion.
#[derive(Debug)]
pub struct ValidatingTransform {
    pipeline: ValidationPipeline,
    fail_on_error: bool,
    metadata_key: String,
}

impl ValidatingTransform {
    pub fn new(pipeline: ValidationPipeline) -> Self {
        Self {
            pipeline,
            fail_on_error: false,
            metadata_key: DEFAULT_REPORT_KEY.to_string(),
        }
    }

    pub fn fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }

    pub fn with_metadata_key(mut self, key: impl Into<String>) -> Self {
        self.metadata_key = key.into();
        self
    }

    pub fn metadata_key(&self) -> &str {
        &self.metadata_key
    }

    pub fn pipeline(&self) -> &ValidationPipeline {
        &self.pipeline
    }
}

impl Transform for ValidatingTransform {
    fn transform(&self, frame: &IrFrame) -> Result<IrFrame> {
        let report = self
            .pipeline
            .run(&frame.data)
            .map_err(|err| FintranError::transform(self.type_name(), err.to_string()))?;

        if !report.is_valid() {
            warn!(
                failed = report.failed(),
                total = report.total(),
                fail_on_error = self.fail_on_error,
                "validation found errors"
            );
            if self.fail_on_error {
                return Err(FintranError::validation(report));
            }
        }
        info!(key = %self.metadata_key, summary = %report.summary(), "attaching validation report");
        Ok(attach_validation_report(frame, report, &self.metadata_key))
    }

    fn type_name(&self) -> &'static str {
        "ValidatingTransform"
    }
}

/// A new frame carrying `report` after any reports already under `key`.
pub fn attach_validation_report(frame: &IrFrame, report: ValidationReport, key: &str) -> IrFrame {
    frame.with_report(key, report)
}

/// Reports attached under `key`, oldest first; empty when none were attached.
pub fn validation_reports<'a>(frame: &'a IrFrame, key: &str) -> &'a [ValidationReport] {
    frame.reports(key)
}
