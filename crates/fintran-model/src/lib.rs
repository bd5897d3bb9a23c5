//! Core data model for fintran.
//!
//! Holds the fixed IR contract every reader produces and every writer
//! consumes, the validation result and report types, the dataset wrapper
//! passed between pipeline steps and the error taxonomy shared by all crates.

pub mod error;
pub mod frame;
pub mod report;
pub mod result;
pub mod schema;
pub mod traits;

pub use error::{
    ErrorCategory, FintranError, PipelineError, PipelineStep, Result, SchemaError, StepContext,
};
pub use frame::{FrameId, FrameMeta, IrFrame};
pub use report::{SeverityFilter, ValidationReport};
pub use result::{Metadata, ValidationResult};
pub use schema::{IrField, IrType, empty_ir, ir_schema, validate_ir};
pub use traits::{FormatOptions, Reader, Transform, Writer};
