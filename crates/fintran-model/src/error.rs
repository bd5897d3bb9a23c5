//! Error taxonomy shared by every fintran crate.
//!
//! Reader, writer and transform errors carry their own domain context and pass
//! through the orchestrator untouched. Everything else is wrapped exactly once
//! in a [`PipelineError`] tagged with the step it escaped from.

use std::fmt;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::report::ValidationReport;

/// A violation of the fixed IR contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Missing required fields: {fields:?}")]
    MissingFields { fields: Vec<String> },
    #[error("Unexpected fields not in IR schema: {fields:?}")]
    UnexpectedFields { fields: Vec<String> },
    #[error("Field '{field}' has incorrect type [expected_type={expected}, actual_type={actual}]")]
    WrongType {
        field: String,
        expected: String,
        actual: String,
    },
}

/// Coarse error category, used for pass-through decisions and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Reader,
    Writer,
    Transform,
    Schema,
    Validation,
    Pipeline,
    Internal,
}

#[derive(Debug, Error)]
pub enum FintranError {
    #[error("{message}{}", reader_context(.path, .format, .line))]
    Reader {
        path: PathBuf,
        format: String,
        line: Option<usize>,
        message: String,
    },
    #[error("{message} [output_path={}, format={format}]", .path.display())]
    Writer {
        path: PathBuf,
        format: String,
        message: String,
    },
    #[error("{message} [transform_name={transform}]")]
    Transform { transform: String, message: String },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(
        "Validation failed: {} of {} validators failed",
        .report.failed(),
        .report.total()
    )]
    Validation { report: Box<ValidationReport> },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn reader_context(path: &std::path::Path, format: &str, line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(
            " [file_path={}, line_number={line}, format={format}]",
            path.display()
        ),
        None => format!(" [file_path={}, format={format}]", path.display()),
    }
}

impl FintranError {
    pub fn reader(
        path: impl Into<PathBuf>,
        format: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Reader {
            path: path.into(),
            format: format.into(),
            line: None,
            message: message.into(),
        }
    }

    pub fn writer(
        path: impl Into<PathBuf>,
        format: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Writer {
            path: path.into(),
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn transform(transform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            transform: transform.into(),
            message: message.into(),
        }
    }

    pub fn validation(report: ValidationReport) -> Self {
        Self::Validation {
            report: Box::new(report),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Reader { .. } => ErrorCategory::Reader,
            Self::Writer { .. } => ErrorCategory::Writer,
            Self::Transform { .. } => ErrorCategory::Transform,
            Self::Schema(_) => ErrorCategory::Schema,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Pipeline(_) => ErrorCategory::Pipeline,
            Self::Polars(_) | Self::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Finds a validation report carried anywhere in the wrapped chain.
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation { report } => Some(report.as_ref()),
            Self::Pipeline(err) => err.cause().and_then(Self::validation_report),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FintranError>;

/// Orchestrator step an error escaped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Read,
    ValidateReaderOutput,
    Transform(usize),
    ValidateFinalIr,
    Write,
    Unknown,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::ValidateReaderOutput => f.write_str("validate_reader_output"),
            Self::Transform(index) => write!(f, "transform_{index}"),
            Self::ValidateFinalIr => f.write_str("validate_final_ir"),
            Self::Write => f.write_str("write"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Context fields attached to a [`PipelineError`]. Absent fields are not rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepContext {
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub transform_index: Option<usize>,
    pub transform_type: Option<String>,
    pub transform_count: Option<usize>,
}

impl StepContext {
    pub fn input(path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn output(path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn transform(index: usize, transform_type: impl Into<String>) -> Self {
        Self {
            transform_index: Some(index),
            transform_type: Some(transform_type.into()),
            ..Self::default()
        }
    }

    pub fn transform_count(count: usize) -> Self {
        Self {
            transform_count: Some(count),
            ..Self::default()
        }
    }
}

/// A step-tagged orchestration failure.
#[derive(Debug)]
pub struct PipelineError {
    pub step: PipelineStep,
    pub message: String,
    pub context: StepContext,
    source: Option<Box<FintranError>>,
}

impl PipelineError {
    pub fn new(step: PipelineStep, message: impl Into<String>, context: StepContext) -> Self {
        Self {
            step,
            message: message.into(),
            context,
            source: None,
        }
    }

    pub fn with_source(mut self, source: FintranError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The wrapped error, when this failure was caused by one.
    pub fn cause(&self) -> Option<&FintranError> {
        self.source.as_deref()
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [step={}", self.message, self.step)?;
        let ctx = &self.context;
        if let Some(path) = &ctx.input_path {
            write!(f, ", input_path={}", path.display())?;
        }
        if let Some(path) = &ctx.output_path {
            write!(f, ", output_path={}", path.display())?;
        }
        if let Some(index) = ctx.transform_index {
            write!(f, ", transform_index={index}")?;
        }
        if let Some(kind) = &ctx.transform_type {
            write!(f, ", transform_type={kind}")?;
        }
        if let Some(count) = ctx.transform_count {
            write!(f, ", transform_count={count}")?;
        }
        f.write_str("]")
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}
