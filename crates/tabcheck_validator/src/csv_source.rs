//! Delimited text files read with the `csv` crate.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::SourceError;
use crate::source::{RowSource, Rows};

const UTF8_BOM: char = '\u{feff}';

/// A CSV (or other delimited) file.
///
/// Records may have any length; row length is a validation concern, not a
/// parsing one.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
    quote: u8,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            quote: b'"',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }
}

impl RowSource for CsvSource {
    /// The file name alone, or the whole path when it has none.
    fn name(&self) -> String {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.path.display().to_string(),
        }
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn open(&self) -> Result<Rows<'_>, SourceError> {
        debug!(
            path = %self.path.display(),
            delimiter = %char::from(self.delimiter),
            "Opening CSV source"
        );
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .from_path(&self.path)?;

        let mut first = true;
        Ok(Box::new(reader.into_records().map(move |record| {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if first {
                first = false;
                if let Some(cell) = row.first_mut() {
                    if let Some(rest) = cell.strip_prefix(UTF8_BOM) {
                        *cell = rest.to_string();
                    }
                }
            }
            Ok(row)
        })))
    }
}
