//! Declarative validation documents.
//!
//! A document is a JSON-shaped tree:
//!
//! ```json
//! {
//!   "validators": [
//!     {"type": "positive_amounts", "params": {"account_patterns": ["^4[0-9]{3}"]}},
//!     {"type": "detect_duplicates", "params": {"fields": ["reference"]}, "severity": "warning"}
//!   ],
//!   "mode": "continue"
//! }
//! ```
//!
//! Compilation is two-phase. [`validate_config_schema`] checks the structure
//! and the registry names before anything is built, then [`parse_config`]
//! constructs each validator from its `params`. No partial pipeline is ever
//! returned.

use std::fmt;
use std::fs;
use std::path::Path;

use fintran_model::ValidationResult;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::business::{CurrencyConsistencyValidator, DateRangeValidator, PositiveAmountsValidator};
use crate::error::{ConfigSchemaError, ValidationError};
use crate::pipeline::{ValidationMode, ValidationPipeline};
use crate::quality::{
    DuplicateDetectionValidator, MissingValueDetectionValidator, OutlierDetectionValidator,
};
use crate::validator::{ConfiguredValidator, Validator};

const MODES: [&str; 2] = ["fail_fast", "continue"];
const SEVERITIES: [&str; 2] = ["error", "warning"];
const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    /// Findings are reported as warnings and never fail the pipeline.
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a registry entry could not build its validator.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// `params` did not deserialize into the validator's config.
    #[error("{0}")]
    Params(#[source] serde_json::Error),
    /// The config deserialized but the validator refused it.
    #[error("{0}")]
    Rejected(#[source] ValidationError),
}

type Constructor = fn(&Map<String, Value>) -> Result<Box<dyn Validator>, BuildError>;

fn construct<V: ConfiguredValidator>(
    params: &Map<String, Value>,
) -> Result<Box<dyn Validator>, BuildError> {
    let config: V::Config =
        serde_json::from_value(Value::Object(params.clone())).map_err(BuildError::Params)?;
    let validator = V::from_config(config).map_err(BuildError::Rejected)?;
    Ok(Box::new(validator))
}

/// One registry entry. Aliases share the canonical validator's constructor.
#[derive(Clone, Copy)]
pub struct RegisteredValidator {
    pub name: &'static str,
    pub canonical: &'static str,
    construct: Constructor,
}

impl RegisteredValidator {
    pub fn is_alias(&self) -> bool {
        self.name != self.canonical
    }

    /// Builds the validator from a parameter map.
    pub fn build(&self, params: &Map<String, Value>) -> Result<Box<dyn Validator>, BuildError> {
        (self.construct)(params)
    }
}

impl fmt::Debug for RegisteredValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredValidator")
            .field("name", &self.name)
            .field("canonical", &self.canonical)
            .finish_non_exhaustive()
    }
}

macro_rules! entry {
    ($name:expr, $validator:ty) => {
        RegisteredValidator {
            name: $name,
            canonical: <$validator as ConfiguredValidator>::NAME,
            construct: construct::<$validator>,
        }
    };
}

static REGISTRY: &[RegisteredValidator] = &[
    entry!("positive_amounts", PositiveAmountsValidator),
    entry!("currency_consistency", CurrencyConsistencyValidator),
    entry!("date_range", DateRangeValidator),
    entry!("duplicate_detection", DuplicateDetectionValidator),
    entry!("detect_duplicates", DuplicateDetectionValidator),
    entry!("missing_value_detection", MissingValueDetectionValidator),
    entry!("detect_missing", MissingValueDetectionValidator),
    entry!("outlier_detection", OutlierDetectionValidator),
    entry!("detect_outliers", OutlierDetectionValidator),
];

/// Every accepted type name, canonical and alias, sorted.
pub fn registered_types() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = REGISTRY.iter().map(|entry| entry.name).collect();
    names.sort_unstable();
    names
}

pub fn lookup(name: &str) -> Option<&'static RegisteredValidator> {
    REGISTRY.iter().find(|entry| entry.name == name)
}

/// JSON-schema shaped description of the document format, for tooling.
pub fn configuration_schema() -> Value {
    json!({
        "type": "object",
        "required": ["validators"],
        "properties": {
            "validators": {
                "type": "array",
                "description": "List of validator specifications",
                "items": {
                    "type": "object",
                    "required": ["type"],
                    "properties": {
                        "type": {
                            "type": "string",
                            "description": "Validator type identifier",
                            "enum": registered_types(),
                        },
                        "params": {
                            "type": "object",
                            "description": "Validator-specific parameters",
                        },
                        "severity": {
                            "type": "string",
                            "description": "Validation severity level",
                            "enum": SEVERITIES,
                            "default": Severity::default().as_str(),
                        },
                    },
                },
            },
            "mode": {
                "type": "string",
                "description": "Pipeline execution mode",
                "enum": MODES,
                "default": ValidationMode::default().as_str(),
            },
        },
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn bare(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Checks the document structure without constructing anything.
pub fn validate_config_schema(config: &Value) -> Result<(), ConfigSchemaError> {
    let Value::Object(document) = config else {
        return Err(ConfigSchemaError::new(format!(
            "Configuration must be an object, got: {}",
            type_name(config)
        ))
        .reason("Invalid configuration type"));
    };

    let Some(validators) = document.get("validators") else {
        return Err(
            ConfigSchemaError::new("Configuration must contain 'validators' key")
                .field("validators")
                .reason("Required field missing"),
        );
    };
    let Value::Array(specs) = validators else {
        return Err(ConfigSchemaError::new(format!(
            "'validators' must be an array, got: {}",
            type_name(validators)
        ))
        .field("validators")
        .value(validators.clone())
        .reason("Invalid field type"));
    };
    for (index, spec) in specs.iter().enumerate() {
        validate_validator_spec(spec, index)?;
    }

    if let Some(mode) = document.get("mode")
        && !mode.as_str().is_some_and(|m| MODES.contains(&m))
    {
        return Err(invalid_mode(mode));
    }
    Ok(())
}

fn invalid_mode(mode: &Value) -> ConfigSchemaError {
    ConfigSchemaError::new(format!(
        "Invalid mode: {}. Must be 'fail_fast' or 'continue'",
        bare(mode)
    ))
    .field("mode")
    .value(mode.clone())
    .reason("Invalid mode value")
}

fn validate_validator_spec(spec: &Value, index: usize) -> Result<(), ConfigSchemaError> {
    let Value::Object(spec) = spec else {
        return Err(ConfigSchemaError::new(format!(
            "Validator at index {index} must be an object, got: {}",
            type_name(spec)
        ))
        .at_index(index)
        .reason("Invalid validator specification type"));
    };

    let Some(kind) = spec.get("type") else {
        return Err(ConfigSchemaError::new(format!(
            "Validator at index {index} missing required 'type' field"
        ))
        .at_index(index)
        .field("type")
        .reason("Required field missing"));
    };
    let Some(kind) = kind.as_str() else {
        return Err(ConfigSchemaError::new(format!(
            "Validator type at index {index} must be a string, got: {}",
            type_name(kind)
        ))
        .at_index(index)
        .field("type")
        .value(kind.clone())
        .reason("Invalid field type"));
    };
    if lookup(kind).is_none() {
        return Err(ConfigSchemaError::new(format!(
            "Unknown validator type at index {index}: '{kind}'. Available types: {}",
            registered_types().join(", ")
        ))
        .at_index(index)
        .validator_type(kind)
        .field("type")
        .reason("Validator type not found in registry"));
    }

    if let Some(params) = spec.get("params")
        && !params.is_object()
    {
        return Err(ConfigSchemaError::new(format!(
            "Validator params at index {index} must be an object, got: {}",
            type_name(params)
        ))
        .at_index(index)
        .validator_type(kind)
        .field("params")
        .value(params.clone())
        .reason("Invalid field type"));
    }

    if let Some(severity) = spec.get("severity")
        && !severity.as_str().is_some_and(|s| SEVERITIES.contains(&s))
    {
        return Err(ConfigSchemaError::new(format!(
            "Validator severity at index {index} must be 'error' or 'warning', got: {}",
            bare(severity)
        ))
        .at_index(index)
        .validator_type(kind)
        .field("severity")
        .value(severity.clone())
        .reason("Invalid severity value"));
    }
    Ok(())
}

/// Compiles a document into a pipeline.
///
/// # Errors
///
/// Any structural problem, or a validator rejecting its `params`, is a
/// [`ConfigSchemaError`] naming the offending index and type.
pub fn parse_config(config: &Value) -> Result<ValidationPipeline, ConfigSchemaError> {
    validate_config_schema(config)?;

    let mode = match config.get("mode") {
        Some(mode) => {
            serde_json::from_value::<ValidationMode>(mode.clone()).map_err(|_| invalid_mode(mode))?
        }
        None => ValidationMode::default(),
    };

    let specs = config
        .get("validators")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let no_params = Map::new();
    let mut validators: Vec<Box<dyn Validator>> = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let kind = spec.get("type").and_then(Value::as_str).unwrap_or_default();
        let Some(entry) = lookup(kind) else {
            return Err(ConfigSchemaError::new(format!(
                "Unknown validator type at index {index}: '{kind}'"
            ))
            .at_index(index)
            .validator_type(kind));
        };
        let params = spec
            .get("params")
            .and_then(Value::as_object)
            .unwrap_or(&no_params);
        let severity = spec
            .get("severity")
            .and_then(Value::as_str)
            .map_or(Severity::Error, |s| {
                if s == "warning" {
                    Severity::Warning
                } else {
                    Severity::Error
                }
            });

        let validator = entry.build(params).map_err(|err| {
            let message = match &err {
                BuildError::Params(_) => {
                    format!("Invalid parameters for validator '{kind}' at index {index}: {err}")
                }
                BuildError::Rejected(_) => {
                    format!("Validator '{kind}' at index {index} rejected parameters: {err}")
                }
            };
            ConfigSchemaError::new(message)
                .at_index(index)
                .validator_type(kind)
                .field("params")
                .value(Value::Object(params.clone()))
                .reason(err.to_string())
        })?;

        debug!(
            index,
            validator_type = kind,
            canonical = entry.canonical,
            %severity,
            "resolved validator"
        );
        validators.push(match severity {
            Severity::Error => validator,
            Severity::Warning => Box::new(Demoted { inner: validator }),
        });
    }

    Ok(ValidationPipeline::new(validators, mode))
}

/// Reads a document from disk. `.json` and `.toml` are parsed by extension;
/// any other file is tried as JSON, then TOML.
pub fn load_document(path: &Path) -> Result<Value, ConfigSchemaError> {
    let text = fs::read_to_string(path).map_err(|err| {
        ConfigSchemaError::new(format!(
            "Failed to read configuration file {}: {err}",
            path.display()
        ))
        .reason(err.kind().to_string())
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let document = match extension.as_deref() {
        Some("json") => parse_json(&text, path)?,
        Some("toml") => parse_toml(&text, path)?,
        _ => match parse_json(&text, path) {
            Ok(value) => value,
            Err(_) => parse_toml(&text, path).map_err(|_| {
                ConfigSchemaError::new(format!(
                    "Configuration file {} is neither valid JSON nor valid TOML",
                    path.display()
                ))
                .reason("Unrecognized document format")
            })?,
        },
    };

    if !document.is_object() {
        return Err(ConfigSchemaError::new(format!(
            "Configuration file must contain an object, got: {}",
            type_name(&document)
        ))
        .reason("Invalid document structure"));
    }
    Ok(document)
}

fn parse_json(text: &str, path: &Path) -> Result<Value, ConfigSchemaError> {
    serde_json::from_str(text).map_err(|err| {
        ConfigSchemaError::new(format!("Invalid JSON in {}: {err}", path.display()))
            .reason("Malformed JSON")
    })
}

fn parse_toml(text: &str, path: &Path) -> Result<Value, ConfigSchemaError> {
    let value: Value = toml::from_str(text).map_err(|err| {
        ConfigSchemaError::new(format!("Invalid TOML in {}: {}", path.display(), err.message()))
            .reason("Malformed TOML")
    })?;
    Ok(unwrap_toml_datetimes(value))
}

// TOML datetimes deserialize as a single-key marker object.
fn unwrap_toml_datetimes(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            if map.len() == 1
                && let Some(Value::String(datetime)) = map.get(TOML_DATETIME_KEY)
            {
                return Value::String(datetime.clone());
            }
            Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, unwrap_toml_datetimes(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap_toml_datetimes).collect()),
        other => other,
    }
}

/// [`load_document`] followed by [`validate_config_schema`].
pub fn load_validation_config(path: &Path) -> Result<Value, ConfigSchemaError> {
    let document = load_document(path)?;
    validate_config_schema(&document)?;
    Ok(document)
}

/// Runs a validator and reports its errors as warnings.
struct Demoted {
    inner: Box<dyn Validator>,
}

impl Validator for Demoted {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn validate(&self, df: &DataFrame) -> Result<ValidationResult, ValidationError> {
        let (name, errors, warnings, metadata) = self.inner.validate(df)?.into_parts();
        let demoted = errors.len();
        let warnings = errors.into_iter().chain(warnings).collect();
        let result = ValidationResult::new(name, Vec::new(), warnings).with_metadata_map(metadata);
        Ok(if demoted > 0 {
            result.with_metadata("demoted_errors", demoted)
        } else {
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{IntoColumn, NamedFrom, Series};

    fn ledger() -> DataFrame {
        DataFrame::new(vec![
            Series::new("account".into(), &["4000", "4001", "1000"]).into_column(),
            Series::new("amount".into(), &[100.0f64, -5.0, -20.0]).into_column(),
            Series::new("currency".into(), &["EUR", "EUR", "EUR"]).into_column(),
        ])
        .unwrap()
    }

    #[test]
    fn registry_lists_aliases() {
        let names = registered_types();
        assert_eq!(names.len(), 9);
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        let alias = lookup("detect_outliers").unwrap();
        assert!(alias.is_alias());
        assert_eq!(alias.canonical, "outlier_detection");
        assert!(lookup("unknown_x").is_none());
    }

    #[test]
    fn parses_a_pipeline() {
        let pipeline = parse_config(&json!({
            "validators": [
                {"type": "positive_amounts", "params": {"account_patterns": ["^4"]}},
                {"type": "currency_consistency"}
            ],
            "mode": "fail_fast"
        }))
        .unwrap();
        assert_eq!(pipeline.mode(), ValidationMode::FailFast);
        assert_eq!(
            pipeline.validator_names(),
            ["positive_amounts", "currency_consistency"]
        );
    }

    #[test]
    fn unknown_type_is_rejected_before_construction() {
        let err = parse_config(&json!({"validators": [{"type": "unknown_x"}]})).unwrap_err();
        assert_eq!(err.validator_index, Some(0));
        assert_eq!(err.validator_type.as_deref(), Some("unknown_x"));
        assert!(err.message.starts_with("Unknown validator type at index 0: 'unknown_x'"));
        assert!(err.message.contains("detect_duplicates"));
    }

    #[test]
    fn structural_errors_name_the_field() {
        let err = validate_config_schema(&json!({"mode": "continue"})).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("validators"));

        let err =
            validate_config_schema(&json!({"validators": [], "mode": "sometimes"})).unwrap_err();
        assert_eq!(err.message, "Invalid mode: sometimes. Must be 'fail_fast' or 'continue'");

        let err = validate_config_schema(&json!({
            "validators": [{"type": "date_range", "severity": "fatal"}]
        }))
        .unwrap_err();
        assert_eq!(err.field.as_deref(), Some("severity"));

        let err = validate_config_schema(&json!({
            "validators": [{"type": "date_range", "params": [1, 2]}]
        }))
        .unwrap_err();
        assert_eq!(err.field.as_deref(), Some("params"));

        let err = validate_config_schema(&json!({"validators": [{}]})).unwrap_err();
        assert_eq!(err.message, "Validator at index 0 missing required 'type' field");
    }

    #[test]
    fn constructor_rejections_become_schema_errors() {
        let err = parse_config(&json!({
            "validators": [
                {"type": "currency_consistency"},
                {"type": "date_range", "params": {}}
            ]
        }))
        .unwrap_err();
        assert_eq!(err.validator_index, Some(1));
        assert!(
            err.message
                .starts_with("Validator 'date_range' at index 1 rejected parameters")
        );

        let err = parse_config(&json!({
            "validators": [{"type": "detect_missing", "params": {"fields": ["a"], "colour": 1}}]
        }))
        .unwrap_err();
        assert!(
            err.message
                .starts_with("Invalid parameters for validator 'detect_missing' at index 0")
        );
    }

    #[test]
    fn registry_entries_build_their_validators() {
        let entry = lookup("detect_missing").unwrap();
        assert!(entry.is_alias());
        assert_eq!(entry.canonical, "missing_value_detection");

        let params = json!({"fields": ["description"]});
        let validator = entry.build(params.as_object().unwrap()).unwrap();
        assert_eq!(validator.name(), "missing_value_detection");

        let unknown_key = json!({"fields": ["a"], "colour": 1});
        let err = entry.build(unknown_key.as_object().unwrap()).err().unwrap();
        assert!(matches!(err, BuildError::Params(_)));

        let date_range = lookup("date_range").unwrap();
        let err = date_range.build(&Map::new()).err().unwrap();
        assert!(matches!(
            err,
            BuildError::Rejected(ValidationError::Configuration { .. })
        ));
    }

    #[test]
    fn warning_severity_never_fails() {
        let strict = parse_config(&json!({
            "validators": [{"type": "positive_amounts", "params": {"account_patterns": ["^4"]}}]
        }))
        .unwrap();
        assert!(!strict.run(&ledger()).unwrap().is_valid());

        let lenient = parse_config(&json!({
            "validators": [{
                "type": "positive_amounts",
                "params": {"account_patterns": ["^4"]},
                "severity": "warning"
            }]
        }))
        .unwrap();
        let report = lenient.run(&ledger()).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.warnings_count(), 1);
        assert_eq!(report.results()[0].metadata()["demoted_errors"], 1);
    }

    #[test]
    fn schema_exposes_enumerations() {
        let schema = configuration_schema();
        let types = &schema["properties"]["validators"]["items"]["properties"]["type"]["enum"];
        assert_eq!(types.as_array().unwrap().len(), 9);
        assert_eq!(schema["properties"]["mode"]["default"], "continue");
        assert_eq!(
            schema["properties"]["validators"]["items"]["properties"]["severity"]["default"],
            "error"
        );
    }

    #[test]
    fn toml_datetimes_are_flattened() {
        let value = unwrap_toml_datetimes(json!({
            "min_date": {"$__toml_private_datetime": "2024-01-01"},
            "nested": [{"x": 1}]
        }));
        assert_eq!(value, json!({"min_date": "2024-01-01", "nested": [{"x": 1}]}));
    }
}
