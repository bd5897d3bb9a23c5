//! Outcome of a single validator run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured validator findings, keyed canonically so output is reproducible.
pub type Metadata = BTreeMap<String, Value>;

/// Result of one rule check.
///
/// `is_valid` is derived from `errors` at construction and the fields are
/// read-only afterwards, so a result can never claim to pass while carrying
/// errors. Warnings never affect validity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ResultPayload")]
pub struct ValidationResult {
    validator_name: String,
    is_valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
    metadata: Metadata,
}

#[derive(Deserialize)]
struct ResultPayload {
    #[serde(default)]
    validator_name: String,
    is_valid: bool,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    metadata: Metadata,
}

impl TryFrom<ResultPayload> for ValidationResult {
    type Error = String;

    fn try_from(payload: ResultPayload) -> Result<Self, Self::Error> {
        if payload.is_valid != payload.errors.is_empty() {
            return Err(format!(
                "result '{}' has is_valid={} with {} errors",
                payload.validator_name,
                payload.is_valid,
                payload.errors.len()
            ));
        }
        Ok(Self {
            validator_name: payload.validator_name,
            is_valid: payload.is_valid,
            errors: payload.errors,
            warnings: payload.warnings,
            metadata: payload.metadata,
        })
    }
}

impl ValidationResult {
    pub fn new(
        validator_name: impl Into<String>,
        errors: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            validator_name: validator_name.into(),
            is_valid: errors.is_empty(),
            errors,
            warnings,
            metadata: Metadata::new(),
        }
    }

    /// A passing result with no findings.
    pub fn pass(validator_name: impl Into<String>) -> Self {
        Self::new(validator_name, Vec::new(), Vec::new())
    }

    /// A failing result with a single error.
    pub fn fail(validator_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(validator_name, vec![error.into()], Vec::new())
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata_map(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn validator_name(&self) -> &str {
        &self.validator_name
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Splits the result into its parts: name, errors, warnings, metadata.
    pub fn into_parts(self) -> (String, Vec<String>, Vec<String>, Metadata) {
        (self.validator_name, self.errors, self.warnings, self.metadata)
    }

    /// Human-readable rendering with one bullet per finding.
    pub fn format(&self) -> String {
        let status = if self.is_valid { "passed" } else { "failed" };
        let mut lines = vec![format!("[{}] Validation {status}", self.validator_name)];
        if self.has_errors() {
            lines.push("Errors:".to_string());
            lines.extend(self.errors.iter().map(|e| format!("  - {e}")));
        }
        if self.has_warnings() {
            lines.push("Warnings:".to_string());
            lines.extend(self.warnings.iter().map(|w| format!("  - {w}")));
        }
        lines.join("\n")
    }

    /// Folds results into one aggregate named `combined`.
    pub fn combine(results: &[ValidationResult]) -> ValidationResult {
        let errors = results
            .iter()
            .flat_map(|r| r.errors.iter().cloned())
            .collect();
        let warnings = results
            .iter()
            .flat_map(|r| r.warnings.iter().cloned())
            .collect();
        ValidationResult::new("combined", errors, warnings)
            .with_metadata("combined_count", results.len())
    }
}
