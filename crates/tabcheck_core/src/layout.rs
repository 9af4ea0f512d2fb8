//! The schema of a tabular file.
//!
//! A [`Layout`] is declared once and never mutated. Before rows are checked it
//! is resolved against the observed header into a [`ResolvedLayout`], which
//! accounts for anonymous trailing columns and carries the row-length rules.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorNode, LayoutError, Result};
use crate::field::{Field, FieldBuilder};
use crate::rule::CellData;
use crate::rules::{
    FileExists, FileNameMatchesOnePattern, FileNameMatchesPattern, HeaderMatcher, HeaderMode,
    RowLengthGTE, RowLengthLTE, anchored, header_rules,
};
use crate::subject::{DebugPolicy, Subject};

/// Structural options of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutFlags {
    pub header_mode: HeaderMode,
    /// Consume the first row as a header without checking it
    pub skip_header: bool,
    /// The first row is data
    pub no_header: bool,
    /// Accept rows where every value is blank
    pub empty_row_ok: bool,
    /// Accept trailing header cells that are blank, as columns that must stay blank
    pub empty_cols_ok: bool,
}

/// An ordered mapping of column names to fields, plus structural options.
#[derive(Debug)]
pub struct Layout {
    title: Option<String>,
    fields: IndexMap<String, Field>,
    flags: LayoutFlags,
    blank_values: HashMap<String, HashSet<String>>,
    file_patterns: Vec<Regex>,
}

impl Layout {
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder::new()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn fields(&self) -> &IndexMap<String, Field> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn flags(&self) -> LayoutFlags {
        self.flags
    }

    pub fn file_patterns(&self) -> &[Regex] {
        &self.file_patterns
    }

    /// The four header rules for the given matching mode.
    pub fn header_rules(&self, mode: HeaderMode) -> Subject<[String]> {
        let matcher = Arc::new(HeaderMatcher::new(
            self.names().map(str::to_string).collect(),
            mode,
        ));
        let (order, extra, duplicate, missing) = header_rules(matcher);
        Subject::new()
            .with_rule(order)
            .with_rule(extra)
            .with_rule(duplicate)
            .with_rule(missing)
    }

    /// Pre-flight rules run against the source path.
    pub fn file_rules(&self) -> Subject<Path> {
        let mut rules = Subject::new().with_rule(FileExists);
        if !self.file_patterns.is_empty() {
            rules.push(FileNameMatchesPattern::new(self.file_patterns.clone()));
            rules.push(FileNameMatchesOnePattern::new(self.file_patterns.clone()));
        }
        rules
    }

    /// Check a header row with the layout's own flags.
    pub fn check_header(
        &self,
        header: &[String],
        index: usize,
        debug: DebugPolicy,
    ) -> Option<ErrorNode> {
        self.check_header_with(header, index, self.flags, debug)
    }

    /// Check a header row. Trailing blank cells are left out when
    /// `empty_cols_ok` is set.
    pub fn check_header_with(
        &self,
        header: &[String],
        index: usize,
        flags: LayoutFlags,
        debug: DebugPolicy,
    ) -> Option<ErrorNode> {
        let header = significant_header(header, flags);
        let failures = self.header_rules(flags.header_mode).check(header, debug);
        (!failures.is_empty()).then(|| ErrorNode::row(index, failures))
    }

    /// Resolve against an observed header with the layout's own flags.
    pub fn resolve(&self, header: Option<&[String]>) -> ResolvedLayout<'_> {
        self.resolve_with(header, self.flags)
    }

    /// Fix the runtime column count from the observed header.
    pub fn resolve_with(
        &self,
        header: Option<&[String]>,
        flags: LayoutFlags,
    ) -> ResolvedLayout<'_> {
        let anonymous = match header {
            Some(header) if flags.empty_cols_ok => {
                header.len() - significant_header(header, flags).len()
            }
            _ => 0,
        };
        let width = self.fields.len() + anonymous;
        ResolvedLayout {
            layout: self,
            flags,
            anonymous,
            blank: FieldBuilder::empty().build(),
            row_rules: Subject::new()
                .with_rule(RowLengthLTE(width))
                .with_rule(RowLengthGTE(width)),
        }
    }

    /// Check one data row against a layout resolved without a header.
    pub fn check_row(&self, row: &[String], index: usize, debug: DebugPolicy) -> Option<ErrorNode> {
        self.resolve(None).check_row(row, index, debug)
    }

    /// Field name paired with its documentation lines.
    pub fn digest(&self) -> Vec<(String, Vec<String>)> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.digest()))
            .collect()
    }
}

fn significant_header(header: &[String], flags: LayoutFlags) -> &[String] {
    if !flags.empty_cols_ok {
        return header;
    }
    let end = header
        .iter()
        .rposition(|token| !token.is_empty())
        .map_or(0, |ix| ix + 1);
    &header[..end]
}

/// A layout fixed against one file's header.
#[derive(Debug)]
pub struct ResolvedLayout<'a> {
    layout: &'a Layout,
    flags: LayoutFlags,
    anonymous: usize,
    blank: Field,
    row_rules: Subject<[String]>,
}

impl<'a> ResolvedLayout<'a> {
    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    pub fn flags(&self) -> LayoutFlags {
        self.flags
    }

    /// Blank trailing header cells accepted as extra columns.
    pub fn anonymous_columns(&self) -> usize {
        self.anonymous
    }

    /// Expected cells per row.
    pub fn width(&self) -> usize {
        self.layout.len() + self.anonymous
    }

    /// Declared fields in order, then one blank field per anonymous column.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.layout
            .fields
            .iter()
            .map(|(name, field)| (name.as_str(), field))
            .chain(std::iter::repeat_n(("", &self.blank), self.anonymous))
    }

    /// Whether every value is blank, belongs to an ignored field, or is one of
    /// the field's declared blank values.
    pub fn is_empty_row(&self, row: &[String]) -> bool {
        self.columns().zip(row).all(|((name, field), value)| {
            value.is_empty()
                || field.is_ignored()
                || self
                    .layout
                    .blank_values
                    .get(name)
                    .is_some_and(|values| values.contains(value))
        })
    }

    /// Check row length, then every cell. `None` means the row passed.
    pub fn check_row(&self, row: &[String], index: usize, debug: DebugPolicy) -> Option<ErrorNode> {
        let failures = self.row_rules.check(row, debug);
        if !failures.is_empty() {
            return Some(ErrorNode::row(index, failures));
        }
        if self.flags.empty_row_ok && self.is_empty_row(row) {
            return None;
        }

        let mut errors = Vec::new();
        for (column, ((name, field), value)) in self.columns().zip(row).enumerate() {
            let cell = self.cell_data(field, value, row);
            let failures = field.check_cell(&cell, debug);
            if !failures.is_empty() {
                errors.push(ErrorNode::cell(Some(index), column, name, failures));
            }
        }
        (!errors.is_empty()).then(|| ErrorNode::row(index, errors))
    }

    fn cell_data(&self, field: &Field, value: &str, row: &[String]) -> CellData {
        field
            .comparison_columns()
            .into_iter()
            .fold(CellData::new(value), |cell, column| {
                match self
                    .layout
                    .fields
                    .get_index_of(column)
                    .and_then(|ix| row.get(ix))
                {
                    Some(other) => cell.with_compare(column, other.as_str()),
                    None => cell,
                }
            })
    }
}

/// Builder for [`Layout`].
///
/// ```rust
/// use tabcheck_core::{FieldBuilder, HeaderMode, LayoutBuilder};
///
/// let layout = LayoutBuilder::new()
///     .field("id", FieldBuilder::integer(6).unique())
///     .field("name", FieldBuilder::text(40))
///     .header_mode(HeaderMode::StartsWith)
///     .build()
///     .unwrap();
/// assert_eq!(layout.len(), 2);
/// ```
#[derive(Default)]
pub struct LayoutBuilder {
    title: Option<String>,
    fields: Vec<(String, Field)>,
    flags: LayoutFlags,
    blank_values: Vec<(String, Vec<String>)>,
    file_patterns: Vec<String>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a column. Accepts a built [`Field`] or a [`FieldBuilder`].
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.fields.push((name.into(), field.into()));
        self
    }

    pub fn flags(mut self, flags: LayoutFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn header_mode(mut self, mode: HeaderMode) -> Self {
        self.flags.header_mode = mode;
        self
    }

    pub fn skip_header(mut self, skip: bool) -> Self {
        self.flags.skip_header = skip;
        self
    }

    pub fn no_header(mut self, no_header: bool) -> Self {
        self.flags.no_header = no_header;
        self
    }

    pub fn empty_row_ok(mut self, ok: bool) -> Self {
        self.flags.empty_row_ok = ok;
        self
    }

    pub fn empty_cols_ok(mut self, ok: bool) -> Self {
        self.flags.empty_cols_ok = ok;
        self
    }

    /// Values of `field` that count as blank when deciding whether a row is empty.
    pub fn blank_values<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blank_values
            .push((field.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Regular expression the whole file name must match.
    pub fn file_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_patterns.push(pattern.into());
        self
    }

    pub fn build(self) -> Result<Layout> {
        if self.fields.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (name, field) in self.fields {
            if fields.contains_key(&name) {
                return Err(LayoutError::DuplicateField(name));
            }
            fields.insert(name, field);
        }

        for (name, field) in &fields {
            if let Some(column) = field
                .comparison_columns()
                .into_iter()
                .find(|column| !fields.contains_key(*column))
            {
                return Err(LayoutError::UnknownComparisonColumn {
                    field: name.clone(),
                    column: column.to_string(),
                });
            }
        }

        let mut blank_values: HashMap<String, HashSet<String>> = HashMap::new();
        for (name, values) in self.blank_values {
            if !fields.contains_key(&name) {
                return Err(LayoutError::UnknownField(name));
            }
            blank_values.entry(name).or_default().extend(values);
        }

        let file_patterns = self
            .file_patterns
            .into_iter()
            .map(|pattern| {
                anchored(&pattern).map_err(|source| LayoutError::InvalidPattern { pattern, source })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Layout {
            title: self.title,
            fields,
            flags: self.flags,
            blank_values,
            file_patterns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureKind, LengthBound};
    use crate::rules::ColumnComparison;
    use pretty_assertions::assert_eq;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn basic() -> Layout {
        LayoutBuilder::new()
            .field("col1", FieldBuilder::text(1))
            .field("col2", FieldBuilder::integer(1))
            .field("col3", FieldBuilder::date())
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_row_passes() {
        let valid = row(&["A", "1", "2020-01-01"]);
        assert_eq!(basic().check_row(&valid, 1, DebugPolicy::Sanitized), None);
    }

    #[test]
    fn test_bad_date_is_single_cell_error() {
        let err = basic()
            .check_row(&row(&["A", "1", "2020-13-01"]), 1, DebugPolicy::Sanitized)
            .unwrap();
        assert_eq!(
            err,
            ErrorNode::row(
                1,
                vec![ErrorNode::cell(
                    Some(1),
                    2,
                    "col3",
                    vec![ErrorNode::failure(
                        "CanBeDateIso",
                        FailureKind::Conversion,
                        "can be coerced into an ISO-8601 date (YYYY-MM-DD)"
                    )]
                )]
            )
        );
    }

    #[test]
    fn test_row_length_is_checked_before_cells() {
        let layout = basic();
        let long = layout
            .check_row(&row(&["A", "1", "2020-01-01", "x"]), 4, DebugPolicy::Sanitized)
            .unwrap();
        assert_eq!(long.children().len(), 1);
        assert!(long.has_failure(FailureKind::RowLength(LengthBound::Max)));

        let short = layout.check_row(&row(&["", ""]), 5, DebugPolicy::Sanitized).unwrap();
        assert!(short.has_failure(FailureKind::RowLength(LengthBound::Min)));
        assert!(!short.has_failure(FailureKind::NullValue));
    }

    #[test]
    fn test_empty_rows() {
        let strict = basic();
        assert!(strict.check_row(&row(&["", "", ""]), 1, DebugPolicy::Sanitized).is_some());

        let lenient = LayoutBuilder::new()
            .field("a", FieldBuilder::text(3))
            .field("skip", FieldBuilder::ignore())
            .field("flag", FieldBuilder::choice(["Y", "N"]))
            .empty_row_ok(true)
            .blank_values("flag", ["N"])
            .build()
            .unwrap();
        assert_eq!(lenient.check_row(&row(&["", "", ""]), 1, DebugPolicy::Sanitized), None);
        assert_eq!(lenient.check_row(&row(&["", "junk", "N"]), 2, DebugPolicy::Sanitized), None);
        assert!(lenient.check_row(&row(&["", "", "Y"]), 3, DebugPolicy::Sanitized).is_some());
    }

    #[test]
    fn test_column_comparison_through_row() {
        let layout = LayoutBuilder::new()
            .field("a", FieldBuilder::integer(1).rule(ColumnComparison::greater_than("b")))
            .field("b", FieldBuilder::integer(1))
            .build()
            .unwrap();
        assert_eq!(layout.check_row(&row(&["3", "2"]), 1, DebugPolicy::Sanitized), None);

        let err = layout.check_row(&row(&["1", "1"]), 1, DebugPolicy::Sanitized).unwrap();
        assert!(err.has_failure(FailureKind::ColumnComparison));
        assert!(matches!(
            &err.children()[0],
            ErrorNode::Cell { column: 0, name: Some(name), .. } if name == "a"
        ));
    }

    #[test]
    fn test_header_exact() {
        let layout = basic();
        let header = row(&["col1", "col2", "col3"]);
        assert_eq!(layout.check_header(&header, 0, DebugPolicy::Sanitized), None);

        let err = layout
            .check_header(&row(&["col1", "col2"]), 0, DebugPolicy::Sanitized)
            .unwrap();
        assert!(err.has_failure(FailureKind::MissingColumn));

        let two = LayoutBuilder::new()
            .field("col1", FieldBuilder::any())
            .field("col2", FieldBuilder::any())
            .build()
            .unwrap();
        let err = two
            .check_header(&row(&["col1", "col2", "col2"]), 0, DebugPolicy::Sanitized)
            .unwrap();
        assert!(err.has_failure(FailureKind::DuplicateColumn));
    }

    #[test]
    fn test_header_rendering_order() {
        let err = basic()
            .check_header(&row(&["col2", "x"]), 0, DebugPolicy::Sanitized)
            .unwrap();
        assert_eq!(
            err.to_string(),
            " - Row: 1\n   - ColumnOrder: Header row must explicitly match order of definition\n   - NoExtra: Header row must not have unexpected columns\n   - NoMissing: Header row must not be missing any expected columns"
        );
    }

    #[test]
    fn test_header_starts_with_and_contains() {
        let layout = LayoutBuilder::new()
            .field("a", FieldBuilder::any())
            .field("b", FieldBuilder::any())
            .field("c", FieldBuilder::any())
            .header_mode(HeaderMode::StartsWith)
            .build()
            .unwrap();
        assert_eq!(layout.check_header(&row(&["a1", "b1", "c1"]), 0, DebugPolicy::Sanitized), None);
        let err = layout
            .check_header(&row(&["a1", "c1", "b1"]), 0, DebugPolicy::Sanitized)
            .unwrap();
        assert!(err.has_failure(FailureKind::ColumnOrder));
        assert_eq!(err.failures().len(), 1);

        let flags = LayoutFlags {
            header_mode: HeaderMode::Contains,
            ..layout.flags()
        };
        let header = row(&["x_a", "x_b", "x_c"]);
        assert_eq!(
            layout.check_header_with(&header, 0, flags, DebugPolicy::Sanitized),
            None
        );
    }

    #[test]
    fn test_anonymous_trailing_columns() {
        let layout = LayoutBuilder::new()
            .field("a", FieldBuilder::text(2))
            .field("b", FieldBuilder::text(2))
            .empty_cols_ok(true)
            .build()
            .unwrap();
        let header = row(&["a", "b", "", ""]);
        assert_eq!(layout.check_header(&header, 0, DebugPolicy::Sanitized), None);

        let resolved = layout.resolve(Some(&header));
        assert_eq!(resolved.anonymous_columns(), 2);
        assert_eq!(resolved.width(), 4);
        assert_eq!(resolved.check_row(&row(&["x", "y", "", ""]), 1, DebugPolicy::Sanitized), None);

        let err = resolved
            .check_row(&row(&["x", "y", "", "z"]), 2, DebugPolicy::Sanitized)
            .unwrap();
        assert_eq!(
            err.to_string(),
            " - Row: 3\n   - Cell: 3,4\n     - Blank: must be empty/blank"
        );
        assert!(resolved.check_row(&row(&["x", "y"]), 3, DebugPolicy::Sanitized).is_some());
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(LayoutBuilder::new().build(), Err(LayoutError::Empty)));
        assert!(matches!(
            LayoutBuilder::new()
                .field("a", FieldBuilder::any())
                .field("a", FieldBuilder::any())
                .build(),
            Err(LayoutError::DuplicateField(name)) if name == "a"
        ));
        assert!(matches!(
            LayoutBuilder::new()
                .field("a", FieldBuilder::integer(1).rule(ColumnComparison::greater_than("zz")))
                .build(),
            Err(LayoutError::UnknownComparisonColumn { .. })
        ));
        assert!(matches!(
            LayoutBuilder::new()
                .field("a", FieldBuilder::any())
                .blank_values("b", ["x"])
                .build(),
            Err(LayoutError::UnknownField(_))
        ));
        assert!(matches!(
            LayoutBuilder::new()
                .field("a", FieldBuilder::any())
                .file_name_pattern("(")
                .build(),
            Err(LayoutError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_digest() {
        let layout = LayoutBuilder::new()
            .field("x", FieldBuilder::any())
            .build()
            .unwrap();
        assert_eq!(
            layout.digest(),
            vec![("x".to_string(), vec!["cannot be empty/blank".to_string()])]
        );
    }
}
