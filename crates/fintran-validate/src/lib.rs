//! Validation framework for fintran datasets.
//!
//! Validators are stateless rule checks over a `DataFrame`. They are grouped
//! into a [`ValidationPipeline`], built by hand or compiled from a declarative
//! document, and can run inside the conversion pipeline through
//! [`ValidatingTransform`].

pub mod business;
pub mod custom;
pub mod declarative;
pub mod error;
pub mod pipeline;
pub mod quality;
pub mod transform;
pub mod validator;

pub use business::{CurrencyConsistencyValidator, DateRangeValidator, PositiveAmountsValidator};
pub use declarative::{
    BuildError, RegisteredValidator, Severity, configuration_schema, load_document,
    load_validation_config, lookup, parse_config, registered_types, validate_config_schema,
};
pub use error::{ConfigSchemaError, ValidationError};
pub use pipeline::{ValidationMode, ValidationPipeline};
pub use quality::{
    DuplicateDetectionValidator, MissingValueDetectionValidator, OutlierDetectionValidator,
    OutlierMethod,
};
pub use transform::{
    DEFAULT_REPORT_KEY, ValidatingTransform, attach_validation_report, validation_reports,
};
pub use validator::{ConfiguredValidator, FnValidator, Validator};
