use fintran_model::FormatOptions;
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Settings shared by [`crate::CsvReader`] and [`crate::CsvWriter`].
///
/// Recognised option keys are `delimiter` (a single ASCII character) and
/// `date_format` (a chrono format string). Other keys are ignored so one
/// option map can serve every collaborator in a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub date_format: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawOptions {
    #[serde(default)]
    delimiter: Option<String>,
    #[serde(default)]
    date_format: Option<String>,
}

impl CsvOptions {
    pub fn from_format_options(options: &FormatOptions) -> Result<Self, String> {
        let raw: RawOptions = serde_json::from_value(Value::Object(options.clone()))
            .map_err(|err| format!("Invalid CSV options: {err}"))?;
        let mut parsed = Self::default();
        if let Some(delimiter) = raw.delimiter {
            parsed.delimiter = match delimiter.as_bytes() {
                [byte] if byte.is_ascii() => *byte,
                _ => {
                    return Err(format!(
                        "Invalid CSV options: delimiter must be a single ASCII character, got '{delimiter}'"
                    ));
                }
            };
        }
        if let Some(date_format) = raw.date_format {
            if date_format.trim().is_empty() {
                return Err("Invalid CSV options: date_format must not be empty".to_string());
            }
            parsed.date_format = date_format;
        }
        Ok(parsed)
    }
}
