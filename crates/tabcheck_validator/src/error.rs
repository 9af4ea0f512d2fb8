//! Error types for reading row sources and running checks.

use tabcheck_core::FileError;
use thiserror::Error;

/// Errors raised while reading rows, as opposed to validation findings.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be decoded
    #[error("Malformed CSV record: {0}")]
    Csv(#[from] csv::Error),
}

/// Outcome of [`FileValidator::check`](crate::FileValidator::check) when it
/// does not pass.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The source was read and did not satisfy the layout
    #[error("{0}")]
    Invalid(FileError),

    /// The source could not be read to the end
    #[error("Failed to read '{name}': {source}")]
    Source {
        name: String,
        #[source]
        source: SourceError,
    },
}

impl CheckError {
    /// The error tree, when the failure came from validation.
    pub fn file_error(&self) -> Option<&FileError> {
        match self {
            CheckError::Invalid(error) => Some(error),
            CheckError::Source { .. } => None,
        }
    }
}
