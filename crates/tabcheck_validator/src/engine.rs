//! Main validation engine.
//!
//! [`FileValidator`] reads a [`RowSource`] once, front to back:
//! pre-flight file rules, header, data rows, then column rules over the
//! cached values.

use std::time::Instant;

use serde::Serialize;
use tabcheck_core::{ErrorNode, FileError, Layout, LayoutFlags};
use tracing::{debug, info, warn};

use crate::cache::ColumnCache;
use crate::error::{CheckError, SourceError};
use crate::options::{MaxErrors, ValidationOptions};
use crate::source::RowSource;

/// Counters collected during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    /// Data rows checked (header and skipped rows excluded)
    pub rows_read: usize,
    pub rows_failed: usize,
    /// Fields whose values were kept for column rules
    pub cached_columns: usize,
    pub duration_ms: u64,
}

/// Result of a validation run that read its source to the end (or to the
/// point where it had to stop).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Whether validation passed overall
    pub passed: bool,
    pub error: Option<FileError>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    /// Convert into the pass/fail form returned by [`FileValidator::check`].
    pub fn into_result(self) -> Result<(), FileError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Streaming validator for one layout.
///
/// # Example
///
/// ```rust
/// use tabcheck_core::{FailureKind, FieldBuilder, LayoutBuilder};
/// use tabcheck_validator::{CheckError, FileValidator, MemorySource};
///
/// let layout = LayoutBuilder::new()
///     .field("col1", FieldBuilder::text(1))
///     .field("col2", FieldBuilder::integer(1))
///     .field("col3", FieldBuilder::date())
///     .build()
///     .unwrap();
/// let validator = FileValidator::new(layout);
///
/// let good = MemorySource::from_rows("good.csv", [["col1", "col2", "col3"], ["A", "1", "2020-01-01"]]);
/// assert!(validator.check(&good).is_ok());
///
/// let bad = MemorySource::from_rows("bad.csv", [["col1", "col2", "col3"], ["A", "1", "2020-13-01"]]);
/// match validator.check(&bad) {
///     Err(CheckError::Invalid(error)) => assert!(error.has_failure(FailureKind::Conversion)),
///     other => panic!("unexpected outcome: {other:?}"),
/// }
/// ```
#[derive(Debug)]
pub struct FileValidator {
    layout: Layout,
    options: ValidationOptions,
}

impl FileValidator {
    /// Creates a validator with default options.
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            options: ValidationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Layout flags in effect for a run, after option overrides.
    pub fn flags(&self) -> LayoutFlags {
        self.options.effective_flags(self.layout.flags())
    }

    /// Validate a source and report findings.
    ///
    /// Returns `Err` only when the source itself cannot be read. Validation
    /// findings are carried in [`ValidationReport::error`].
    pub fn validate(&self, source: &dyn RowSource) -> Result<ValidationReport, SourceError> {
        let start = Instant::now();
        let name = source.name();
        let flags = self.flags();
        let debug_policy = self.options.debug;
        let mut stats = ValidationStats::default();

        info!(source = %name, fields = self.layout.len(), "Starting validation");

        // 1. Pre-flight file rules
        if let Some(path) = source.path() {
            let failures = self.layout.file_rules().check(path, debug_policy);
            if !failures.is_empty() {
                warn!(source = %name, "File rules failed, no rows read");
                return Ok(self.build_report(name, failures, stats, start));
            }
        }

        let mut rows = source.open()?.enumerate().skip(self.options.skip_rows);
        let mut errors = Vec::new();

        // 2. Header
        let header = if flags.no_header {
            None
        } else {
            match rows.next() {
                Some((index, row)) => Some((index, row?)),
                None => {
                    debug!(source = %name, "Source has no rows");
                    return Ok(self.build_report(name, errors, stats, start));
                }
            }
        };

        if let Some((index, header)) = &header {
            if !flags.skip_header {
                if let Some(error) =
                    self.layout
                        .check_header_with(header, *index, flags, debug_policy)
                {
                    warn!(source = %name, row = index + 1, "Header check failed, rows not read");
                    errors.push(error);
                    return Ok(self.build_report(name, errors, stats, start));
                }
            }
        }

        let resolved = self
            .layout
            .resolve_with(header.as_ref().map(|(_, row)| row.as_slice()), flags);
        if resolved.anonymous_columns() > 0 {
            debug!(
                anonymous = resolved.anonymous_columns(),
                width = resolved.width(),
                "Accepting blank trailing header columns"
            );
        }

        // 3. Data rows
        let mut cache = ColumnCache::for_layout(&self.layout);
        stats.cached_columns = cache.len();

        for (index, row) in rows {
            let row = row?;
            stats.rows_read += 1;
            cache.record(&row);

            let Some(error) = resolved.check_row(&row, index, debug_policy) else {
                continue;
            };
            errors.push(error);
            stats.rows_failed += 1;

            if self.options.max_errors.is_exceeded(stats.rows_failed) {
                if let MaxErrors::Limit(limit) = self.options.max_errors {
                    warn!(source = %name, limit, "Maximum row errors exceeded, stopping");
                    errors.push(ErrorNode::max_exceeded(limit));
                }
                break;
            }
        }

        // 4. Column rules over everything cached
        if !cache.is_empty() {
            errors.extend(cache.check(&self.layout, debug_policy));
        }

        Ok(self.build_report(name, errors, stats, start))
    }

    /// Validate a source, returning the aggregated error tree on failure.
    pub fn check(&self, source: &dyn RowSource) -> Result<(), CheckError> {
        let report = self
            .validate(source)
            .map_err(|error| CheckError::Source {
                name: source.name(),
                source: error,
            })?;
        report.into_result().map_err(CheckError::Invalid)
    }

    /// Builds a validation report from collected errors.
    fn build_report(
        &self,
        name: String,
        errors: Vec<ErrorNode>,
        mut stats: ValidationStats,
        start: Instant,
    ) -> ValidationReport {
        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let passed = errors.is_empty();

        info!(
            source = %name,
            passed,
            rows_read = stats.rows_read,
            rows_failed = stats.rows_failed,
            duration_ms = stats.duration_ms,
            "Validation finished"
        );

        let error = (!passed)
            .then(|| FileError::new(name, None, errors, self.options.coordinate_style));
        ValidationReport {
            passed,
            error,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use pretty_assertions::assert_eq;
    use tabcheck_core::{FailureKind, FieldBuilder, LayoutBuilder};

    fn layout() -> Layout {
        LayoutBuilder::new()
            .field("id", FieldBuilder::integer(2).unique())
            .field("code", FieldBuilder::digit(2))
            .build()
            .unwrap()
    }

    #[test]
    fn test_stats_count_data_rows_only() {
        let source = MemorySource::from_rows(
            "mem",
            [["id", "code"], ["1", "01"], ["2", "x"], ["3", "03"]],
        );
        let report = FileValidator::new(layout()).validate(&source).unwrap();

        assert!(!report.passed);
        assert_eq!(report.stats.rows_read, 3);
        assert_eq!(report.stats.rows_failed, 1);
        assert_eq!(report.stats.cached_columns, 1);
        assert!(report.stats.duration_ms < 60_000);
    }

    #[test]
    fn test_empty_source_passes() {
        let source = MemorySource::new("empty", Vec::new());
        let report = FileValidator::new(layout()).validate(&source).unwrap();
        assert!(report.passed);
        assert_eq!(report.error, None);
    }

    #[test]
    fn test_column_rules_run_after_max_errors_cutoff() {
        let source = MemorySource::from_rows(
            "mem",
            [["id", "code"], ["1", "x"], ["1", "y"], ["2", "z"]],
        );
        let validator = FileValidator::new(layout())
            .with_options(ValidationOptions::new().with_max_errors(MaxErrors::Limit(1)));
        let report = validator.validate(&source).unwrap();

        let error = report.error.unwrap();
        assert!(error.has_failure(FailureKind::MaxExceeded));
        assert!(error.has_failure(FailureKind::DuplicateValue));
        assert_eq!(report.stats.rows_read, 2);
        let last = error.errors().last().unwrap();
        assert!(matches!(last, ErrorNode::Column { index: 0, .. }));
    }

    #[test]
    fn test_check_wraps_report() {
        let validator = FileValidator::new(layout());
        let good = MemorySource::from_rows("good", [["id", "code"], ["1", "22"]]);
        assert!(validator.check(&good).is_ok());

        let bad = MemorySource::from_rows("bad", [["id"]]);
        let err = validator.check(&bad).unwrap_err();
        assert!(err.file_error().unwrap().has_failure(FailureKind::MissingColumn));
    }
}
