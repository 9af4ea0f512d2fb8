//! The row source interface and an in-memory implementation.

use std::path::{Path, PathBuf};

use crate::error::SourceError;

/// Iterator over the rows of an opened source.
pub type Rows<'a> = Box<dyn Iterator<Item = Result<Vec<String>, SourceError>> + 'a>;

/// A tabular input the validator can stream.
///
/// Implementations map format-specific "no value" cells (an empty spreadsheet
/// cell, a null) to the empty string. Every rule treats `""` as missing.
pub trait RowSource {
    /// Identifier used as the name of the `File` error node.
    fn name(&self) -> String;

    /// Filesystem path, if any. Sources without one skip the file rules.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Start reading from the first physical row.
    fn open(&self) -> Result<Rows<'_>, SourceError>;
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    path: Option<PathBuf>,
    rows: Vec<Vec<String>>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            path: None,
            rows,
        }
    }

    /// Build from anything that yields rows of string-like cells.
    pub fn from_rows<I, R, S>(name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// Build from cells that may be absent. Absent cells become `""`.
    pub fn from_optional_cells<I, R, S>(name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self::new(
            name,
            rows.into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|cell| cell.map(Into::into).unwrap_or_default())
                        .collect()
                })
                .collect(),
        )
    }

    /// Attach a path so that the file rules run against it.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowSource for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn open(&self) -> Result<Rows<'_>, SourceError> {
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_source_yields_rows_in_order() {
        let source = MemorySource::from_rows("mem", [["a", "b"], ["1", "2"]]);
        let rows: Vec<Vec<String>> = source.open().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"]]);
        assert_eq!(source.name(), "mem");
        assert!(source.path().is_none());
    }

    #[test]
    fn test_absent_cells_become_empty_strings() {
        let source = MemorySource::from_optional_cells(
            "sheet",
            vec![vec![Some("x"), None, Some("")]],
        );
        let rows: Vec<Vec<String>> = source.open().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(rows, vec![vec!["x", "", ""]]);
    }

    #[test]
    fn test_source_can_be_reopened() {
        let source = MemorySource::from_rows("mem", [["1"], ["2"]]);
        assert_eq!(source.open().unwrap().count(), 2);
        assert_eq!(source.open().unwrap().count(), 2);
        assert_eq!(source.len(), 2);
    }
}
