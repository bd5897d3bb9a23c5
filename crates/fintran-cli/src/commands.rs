use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fintran_core::ConversionPipeline;
use fintran_ingest::Format;
use fintran_model::{
    FintranError, FormatOptions, SeverityFilter, ValidationReport, Writer, ir_schema, validate_ir,
};
use fintran_validate::{
    DEFAULT_REPORT_KEY, ValidatingTransform, ValidationPipeline, configuration_schema,
    load_validation_config, lookup, parse_config, registered_types, validation_reports,
};
use polars::prelude::DataFrame;
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::{CheckArgs, ConvertArgs, FilterArg, ValidateArgs};
use crate::exit::ExitStatus;
use crate::summary::{ConversionSummary, print_conversion, print_report, print_rules, print_schema};

/// Accepts the final frame without persisting it.
struct DiscardWriter;

impl Writer for DiscardWriter {
    fn write(
        &self,
        _df: &DataFrame,
        _path: &Path,
        _options: &FormatOptions,
    ) -> fintran_model::Result<()> {
        Ok(())
    }
}

pub fn run_convert(args: &ConvertArgs) -> Result<ExitStatus> {
    let options = format_options(&args.options);
    let reader = input_format(&args.input)?.reader();
    let writer: Box<dyn Writer> = if args.dry_run {
        Box::new(DiscardWriter)
    } else {
        Format::from_path(&args.output)
            .ok_or_else(|| {
                FintranError::writer(&args.output, "unknown", "Unsupported output format")
            })?
            .writer()
    };

    let mut pipeline = ConversionPipeline::new(reader.as_ref(), writer.as_ref())
        .with_options(options);
    if let Some(rules) = &args.rules {
        let validation = load_rules(rules)?;
        info!(
            validators = validation.len(),
            mode = %validation.mode(),
            "loaded validation rules"
        );
        pipeline = pipeline.add_transform(Box::new(
            ValidatingTransform::new(validation).fail_on_error(args.fail_on_error),
        ));
    }

    match pipeline.execute(&args.input, &args.output) {
        Ok(frame) => {
            let reports = validation_reports(&frame, DEFAULT_REPORT_KEY);
            if let (Some(path), Some(report)) = (&args.report, reports.last()) {
                write_report(report, path)?;
            }
            let summary = ConversionSummary {
                input: &args.input,
                output: (!args.dry_run).then_some(args.output.as_path()),
                rows: frame.height(),
                columns: frame
                    .data
                    .get_column_names()
                    .iter()
                    .map(|name| name.as_str().to_string())
                    .collect(),
                report_file: args.report.as_deref(),
            };
            print_conversion(&summary, reports);
            Ok(ExitStatus::Success)
        }
        Err(err) => {
            if let Some(report) = err.validation_report() {
                if let Some(path) = &args.report {
                    write_report(report, path)?;
                }
                print_report(report, None);
            }
            Err(err.into())
        }
    }
}

pub fn run_check(args: &CheckArgs) -> Result<ExitStatus> {
    let df = input_format(&args.input)?
        .reader()
        .read(&args.input, &format_options(&args.options))?;
    let validation = load_rules(&args.rules)?;
    let report = validation.run(&df)?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        let filter = args.filter.map(|filter| match filter {
            FilterArg::Errors => SeverityFilter::Errors,
            FilterArg::Warnings => SeverityFilter::Warnings,
        });
        print_report(&report, filter);
    }
    if report.is_valid() {
        Ok(ExitStatus::Success)
    } else {
        warn!(failed = report.failed(), "validation rules reported errors");
        Ok(ExitStatus::Validation)
    }
}

pub fn run_validate(args: &ValidateArgs) -> Result<ExitStatus> {
    let df = input_format(&args.input)?
        .reader()
        .read(&args.input, &format_options(&args.options))?;
    validate_ir(&df).map_err(FintranError::from)?;
    println!("{}: valid IR ({} rows)", args.input.display(), df.height());
    if args.verbose {
        for column in df.get_columns() {
            println!("  {} ({})", column.name(), column.dtype());
        }
    }
    Ok(ExitStatus::Success)
}

pub fn run_rules() -> Result<ExitStatus> {
    let types: Vec<(&str, &str)> = registered_types()
        .into_iter()
        .map(|name| {
            let canonical = lookup(name).map_or(name, |entry| entry.canonical);
            (name, canonical)
        })
        .collect();
    print_rules(&types, &configuration_schema())?;
    Ok(ExitStatus::Success)
}

pub fn run_schema() -> Result<ExitStatus> {
    print_schema(&ir_schema());
    Ok(ExitStatus::Success)
}

fn input_format(path: &Path) -> Result<Format, FintranError> {
    Format::from_path(path)
        .ok_or_else(|| FintranError::reader(path, "unknown", "Unsupported input format"))
}

fn format_options(pairs: &[(String, Value)]) -> FormatOptions {
    pairs.iter().cloned().collect()
}

fn load_rules(path: &Path) -> Result<ValidationPipeline> {
    let document = load_validation_config(path)
        .with_context(|| format!("failed to load rules from {}", path.display()))?;
    let pipeline = parse_config(&document)
        .with_context(|| format!("failed to compile rules from {}", path.display()))?;
    Ok(pipeline)
}

fn write_report(report: &ValidationReport, path: &Path) -> Result<()> {
    let json = report
        .to_json()
        .context("failed to serialize validation report")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write validation report to {}", path.display()))
}
