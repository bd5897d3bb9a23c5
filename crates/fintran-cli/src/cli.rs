//! CLI argument definitions for fintran.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "fintran",
    version,
    about = "Convert financial records through a canonical IR and validate them",
    long_about = "Convert financial records between formats through a canonical\n\
                  intermediate representation (IR).\n\n\
                  Validation rules can be attached to a conversion or run on their\n\
                  own from a declarative JSON or TOML rules document."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert INPUT to OUTPUT, optionally validating on the way.
    Convert(ConvertArgs),

    /// Run a rules document against a file and print the report.
    Check(CheckArgs),

    /// Check that a file reads into a well-formed IR.
    Validate(ValidateArgs),

    /// Print the rules document schema, including every validator type.
    Rules,

    /// Print the IR field contract.
    Schema,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Input file; the reader is chosen by extension.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file; the writer is chosen by extension.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Rules document (JSON or TOML) to validate the IR with.
    #[arg(long = "rules", value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Abort the conversion when the rules report errors.
    #[arg(long = "fail-on-error", requires = "rules")]
    pub fail_on_error: bool,

    /// Write the validation report as JSON.
    #[arg(long = "report", value_name = "FILE", requires = "rules")]
    pub report: Option<PathBuf>,

    /// Read, transform and validate without writing OUTPUT.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Format option passed to the reader and writer (repeatable).
    #[arg(long = "option", short = 'o', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub options: Vec<(String, Value)>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// File to check.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Rules document (JSON or TOML).
    #[arg(long = "rules", value_name = "FILE")]
    pub rules: PathBuf,

    /// Only show results with errors, or only results with warnings.
    #[arg(long = "filter", value_enum)]
    pub filter: Option<FilterArg>,

    /// Print the report as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,

    /// Format option passed to the reader (repeatable).
    #[arg(long = "option", short = 'o', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub options: Vec<(String, Value)>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// File to read and check against the IR contract.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Also list the columns that were read.
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Format option passed to the reader (repeatable).
    #[arg(long = "option", short = 'o', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub options: Vec<(String, Value)>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterArg {
    Errors,
    Warnings,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

/// Parses `KEY=VALUE`. Values that read as JSON scalars, arrays or objects
/// keep that type; anything else is a string.
pub fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{raw}'"));
    }
    let value = match serde_json::from_str::<Value>(value) {
        Ok(Value::String(_)) | Err(_) => Value::String(value.to_string()),
        Ok(parsed) => parsed,
    };
    Ok((key.to_string(), value))
}
