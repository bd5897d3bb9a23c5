use std::path::Path;

use fintran_model::{Reader, Writer};

use crate::reader::CsvReader;
use crate::writer::CsvWriter;

/// File formats with a built-in reader and writer, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => crate::CSV_FORMAT,
        }
    }

    pub fn reader(self) -> Box<dyn Reader> {
        match self {
            Self::Csv => Box::new(CsvReader),
        }
    }

    pub fn writer(self) -> Box<dyn Writer> {
        match self {
            Self::Csv => Box::new(CsvWriter),
        }
    }
}
