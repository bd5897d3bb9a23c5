//! File adapters for the fintran IR.
//!
//! [`CsvReader`] parses delimited text into IR-typed columns and
//! [`CsvWriter`] renders an IR frame back out. Both take their settings from
//! the pipeline's [`fintran_model::FormatOptions`]; see [`CsvOptions`].

pub mod format;
pub mod options;
pub mod reader;
pub mod writer;

pub use format::Format;
pub use options::CsvOptions;
pub use reader::CsvReader;
pub use writer::CsvWriter;

pub(crate) const CSV_FORMAT: &str = "csv";
