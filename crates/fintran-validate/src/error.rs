use std::fmt;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    /// A validator rejected its construction parameters.
    #[error("Invalid configuration for {validator} [parameter={parameter}, reason={reason}]")]
    Configuration {
        validator: String,
        parameter: String,
        reason: String,
    },
    /// A validator could not finish inspecting the data.
    #[error("Validator {validator} failed to execute: {reason}")]
    Execution { validator: String, reason: String },
    #[error(transparent)]
    ConfigSchema(#[from] ConfigSchemaError),
}

impl ValidationError {
    pub fn config(validator: &str, parameter: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            validator: validator.to_string(),
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub fn execution(validator: &str, reason: impl fmt::Display) -> Self {
        Self::Execution {
            validator: validator.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A malformed declarative validation document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSchemaError {
    pub message: String,
    pub validator_index: Option<usize>,
    pub validator_type: Option<String>,
    pub field: Option<String>,
    pub value: Option<Value>,
    pub reason: Option<String>,
}

impl ConfigSchemaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.validator_index = Some(index);
        self
    }

    pub fn validator_type(mut self, validator_type: impl Into<String>) -> Self {
        self.validator_type = Some(validator_type.into());
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(index) = self.validator_index {
            parts.push(format!("validator_index={index}"));
        }
        if let Some(kind) = &self.validator_type {
            parts.push(format!("validator_type='{kind}'"));
        }
        if let Some(field) = &self.field {
            parts.push(format!("field='{field}'"));
        }
        if let Some(value) = &self.value {
            parts.push(format!("value={value}"));
        }
        if let Some(reason) = &self.reason {
            parts.push(format!("reason='{reason}'"));
        }
        if parts.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} [{}]", self.message, parts.join(", "))
        }
    }
}

impl std::error::Error for ConfigSchemaError {}
