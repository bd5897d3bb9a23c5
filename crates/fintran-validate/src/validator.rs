//! The validator capability and the function adapter.

use std::fmt;

use fintran_model::ValidationResult;
use polars::prelude::DataFrame;
use serde::de::DeserializeOwned;

use crate::error::ValidationError;

/// A deterministic rule check over a dataset.
///
/// `validate` takes the frame by shared reference and must produce the same
/// result for the same data. Data findings are expressed in the returned
/// [`ValidationResult`]; an `Err` means the check itself could not run.
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;

    fn validate(&self, df: &DataFrame) -> Result<ValidationResult, ValidationError>;
}

impl<V: Validator + ?Sized> Validator for Box<V> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn validate(&self, df: &DataFrame) -> Result<ValidationResult, ValidationError> {
        (**self).validate(df)
    }
}

/// A validator that can be built from a deserialized parameter map.
///
/// Construction is where every parameter rule is enforced, so a built
/// validator never rejects its configuration at `validate` time.
pub trait ConfiguredValidator: Validator + Sized + 'static {
    type Config: DeserializeOwned;

    /// Canonical registry name, also used as the result's `validator_name`.
    const NAME: &'static str;

    fn from_config(config: Self::Config) -> Result<Self, ValidationError>;
}

/// Adapts a closure into a named [`Validator`].
///
/// A result returned with an empty name is renamed to the adapter's name.
pub struct FnValidator<F> {
    name: String,
    func: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&DataFrame) -> Result<ValidationResult, ValidationError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&DataFrame) -> Result<ValidationResult, ValidationError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, df: &DataFrame) -> Result<ValidationResult, ValidationError> {
        let result = (self.func)(df)?;
        if !result.validator_name().is_empty() {
            return Ok(result);
        }
        let (_, errors, warnings, metadata) = result.into_parts();
        Ok(ValidationResult::new(self.name.clone(), errors, warnings).with_metadata_map(metadata))
    }
}
