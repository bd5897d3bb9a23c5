//! Process exit codes.

use fintran_model::{ErrorCategory, FintranError, PipelineStep};
use fintran_validate::{ConfigSchemaError, ValidationError};

/// Exit status reported by the `fintran` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    Unexpected = 1,
    /// Schema violation or failed validation rules.
    Validation = 2,
    Reader = 3,
    Writer = 4,
    Transform = 5,
    /// Rules document could not be loaded or compiled.
    Config = 6,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

pub fn status_for_fintran(err: &FintranError) -> ExitStatus {
    if let FintranError::Pipeline(pipeline) = err {
        return match pipeline.step {
            PipelineStep::Read => ExitStatus::Reader,
            PipelineStep::Write => ExitStatus::Writer,
            PipelineStep::ValidateReaderOutput | PipelineStep::ValidateFinalIr => {
                ExitStatus::Validation
            }
            PipelineStep::Transform(_) if err.validation_report().is_some() => {
                ExitStatus::Validation
            }
            PipelineStep::Transform(_) => ExitStatus::Transform,
            PipelineStep::Unknown => ExitStatus::Unexpected,
        };
    }
    match err.category() {
        ErrorCategory::Reader => ExitStatus::Reader,
        ErrorCategory::Writer => ExitStatus::Writer,
        ErrorCategory::Transform => ExitStatus::Transform,
        ErrorCategory::Schema | ErrorCategory::Validation => ExitStatus::Validation,
        ErrorCategory::Pipeline | ErrorCategory::Internal => ExitStatus::Unexpected,
    }
}

/// Picks the exit status for the first recognised error in the chain.
pub fn exit_status(err: &anyhow::Error) -> ExitStatus {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<FintranError>() {
            return status_for_fintran(err);
        }
        if cause.downcast_ref::<ConfigSchemaError>().is_some() {
            return ExitStatus::Config;
        }
        if let Some(err) = cause.downcast_ref::<ValidationError>() {
            return match err {
                ValidationError::Configuration { .. } | ValidationError::ConfigSchema(_) => {
                    ExitStatus::Config
                }
                ValidationError::Execution { .. } => ExitStatus::Unexpected,
            };
        }
    }
    ExitStatus::Unexpected
}
