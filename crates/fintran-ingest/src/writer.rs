use std::path::Path;

use csv::WriterBuilder;
use fintran_common::{date_values, string_values};
use fintran_model::{FintranError, FormatOptions, Result, Writer};
use polars::prelude::{Column, DataFrame, DataType, PolarsResult};
use tracing::debug;

use crate::CSV_FORMAT;
use crate::options::CsvOptions;

/// Writes a frame as headed CSV. Nulls become empty cells and `Date` columns
/// are rendered with the configured `date_format`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

fn write_error(path: &Path, message: impl Into<String>) -> FintranError {
    FintranError::writer(path, CSV_FORMAT, message)
}

fn render_column(column: &Column, options: &CsvOptions) -> PolarsResult<Vec<String>> {
    if column.dtype() == &DataType::Date {
        return Ok(date_values(column)?
            .into_iter()
            .map(|date| {
                date.map(|d| d.format(&options.date_format).to_string())
                    .unwrap_or_default()
            })
            .collect());
    }
    Ok(string_values(column)?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

impl Writer for CsvWriter {
    fn write(&self, df: &DataFrame, path: &Path, options: &FormatOptions) -> Result<()> {
        let options =
            CsvOptions::from_format_options(options).map_err(|msg| write_error(path, msg))?;
        let cells = df
            .get_columns()
            .iter()
            .map(|column| render_column(column, &options))
            .collect::<PolarsResult<Vec<_>>>()
            .map_err(|err| write_error(path, format!("Failed to render column: {err}")))?;

        let mut writer = WriterBuilder::new()
            .delimiter(options.delimiter)
            .from_path(path)
            .map_err(|err| write_error(path, format!("Failed to create CSV file: {err}")))?;
        writer
            .write_record(df.get_column_names().iter().map(|name| name.as_str()))
            .map_err(|err| write_error(path, format!("Failed to write header: {err}")))?;
        for row in 0..df.height() {
            writer
                .write_record(cells.iter().map(|column| column[row].as_str()))
                .map_err(|err| write_error(path, format!("Failed to write row {row}: {err}")))?;
        }
        writer
            .flush()
            .map_err(|err| write_error(path, format!("Failed to flush CSV file: {err}")))?;
        debug!(path = %path.display(), rows = df.height(), "wrote csv");
        Ok(())
    }
}
