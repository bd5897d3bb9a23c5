use std::path::Path;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use fintran_common::date_to_days;
use fintran_model::{FintranError, FormatOptions, Reader, Result};
use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, PolarsResult, Series};
use tracing::debug;

use crate::CSV_FORMAT;
use crate::options::CsvOptions;

/// Reads a headed CSV file into IR-typed columns.
///
/// `date` is parsed with the configured `date_format` into a `Date` column,
/// `amount` into `Float64`; every other column stays text. Empty cells are
/// nulls. A malformed row or unparseable value fails with the line it was
/// found on.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReader;

enum ColumnBuilder {
    Date(Vec<Option<i32>>),
    Amount(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnBuilder {
    fn for_header(name: &str) -> Self {
        match name {
            "date" => Self::Date(Vec::new()),
            "amount" => Self::Amount(Vec::new()),
            _ => Self::Text(Vec::new()),
        }
    }

    fn push(
        &mut self,
        name: &str,
        cell: &str,
        options: &CsvOptions,
    ) -> std::result::Result<(), String> {
        let cell = cell.trim();
        match self {
            Self::Date(values) => {
                if cell.is_empty() {
                    values.push(None);
                    return Ok(());
                }
                let date = NaiveDate::parse_from_str(cell, &options.date_format).map_err(|_| {
                    format!(
                        "Invalid date '{cell}' in column '{name}' (expected format {})",
                        options.date_format
                    )
                })?;
                values.push(Some(date_to_days(date)));
            }
            Self::Amount(values) => {
                if cell.is_empty() {
                    values.push(None);
                    return Ok(());
                }
                let amount = cell
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid amount '{cell}' in column '{name}'"))?;
                values.push(Some(amount));
            }
            Self::Text(values) => {
                values.push((!cell.is_empty()).then(|| cell.to_string()));
            }
        }
        Ok(())
    }

    fn finish(self, name: &str) -> PolarsResult<Column> {
        let series = match self {
            Self::Date(values) => Series::new(name.into(), values).cast(&DataType::Date)?,
            Self::Amount(values) => Series::new(name.into(), values),
            Self::Text(values) => Series::new(name.into(), values),
        };
        Ok(series.into_column())
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn read_error(path: &Path, line: Option<u64>, message: impl Into<String>) -> FintranError {
    FintranError::Reader {
        path: path.to_path_buf(),
        format: CSV_FORMAT.to_string(),
        line: line.and_then(|line| usize::try_from(line).ok()),
        message: message.into(),
    }
}

fn csv_error(path: &Path, err: &csv::Error) -> FintranError {
    let line = err.position().map(csv::Position::line);
    read_error(path, line, format!("Malformed CSV: {err}"))
}

impl Reader for CsvReader {
    fn read(&self, path: &Path, options: &FormatOptions) -> Result<DataFrame> {
        let options =
            CsvOptions::from_format_options(options).map_err(|msg| read_error(path, None, msg))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(options.delimiter)
            .from_path(path)
            .map_err(|err| read_error(path, None, format!("Failed to open CSV file: {err}")))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|err| csv_error(path, &err))?
            .iter()
            .map(normalize_header)
            .collect();
        let mut builders: Vec<ColumnBuilder> = headers
            .iter()
            .map(|name| ColumnBuilder::for_header(name))
            .collect();

        let mut rows = 0usize;
        for record in reader.records() {
            let record = record.map_err(|err| csv_error(path, &err))?;
            let line = record.position().map(csv::Position::line);
            for ((builder, name), cell) in builders.iter_mut().zip(&headers).zip(record.iter()) {
                builder
                    .push(name, cell, &options)
                    .map_err(|msg| read_error(path, line, msg))?;
            }
            rows += 1;
        }

        let columns = builders
            .into_iter()
            .zip(&headers)
            .map(|(builder, name)| builder.finish(name))
            .collect::<PolarsResult<Vec<_>>>()?;
        let df = DataFrame::new(columns)
            .map_err(|err| read_error(path, Some(1), format!("Invalid CSV header: {err}")))?;
        debug!(path = %path.display(), rows, columns = df.width(), "parsed csv");
        Ok(df)
    }
}
