//! Error types for tabular checks.
//!
//! Two families live here. [`LayoutError`] is a regular Rust error raised while
//! building a layout. [`ErrorNode`] is the diagnostic tree produced by a check:
//! File → Row → Cell/Column → rule failure. Tree nodes only ever carry
//! coordinates and rule explanations, never the value that was checked.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type for layout construction.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors raised while building a [`Layout`](crate::Layout) or one of its fields.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Two fields share the same name
    #[error("Duplicate field '{0}' in layout")]
    DuplicateField(String),

    /// A comparison rule references a column the layout does not declare
    #[error("Field '{field}' compares against unknown column '{column}'")]
    UnknownComparisonColumn {
        /// Field declaring the comparison
        field: String,
        /// Referenced column
        column: String,
    },

    /// An option references a field the layout does not declare
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    /// A field type is missing one of its required parameters
    #[error("Field '{field}' of type {field_type} requires '{parameter}'")]
    MissingParameter {
        /// Field name
        field: String,
        /// Declared type
        field_type: String,
        /// Missing parameter
        parameter: String,
    },

    /// A file name pattern is not a valid regular expression
    #[error("Invalid file name pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },

    /// The layout declares no fields
    #[error("Layout must declare at least one field")]
    Empty,
}

/// Which side of a length bound was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LengthBound {
    Min,
    Max,
    Exact,
}

/// Classification of a single rule failure.
///
/// Every rule declares the kind it produces when constructed, so consumers can
/// search a tree for a category of problem without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    NullValue,
    Length(LengthBound),
    Conversion,
    LeadingZero,
    InvalidChoice,
    CurrencyPattern,
    Character,
    ValueComparison,
    ColumnComparison,
    RowLength(LengthBound),
    MissingColumn,
    UnexpectedColumn,
    DuplicateColumn,
    ColumnOrder,
    DuplicateValue,
    RowComparison,
    PreProcessing,
    MaxExceeded,
    Custom,
    FileNotFound,
    FilePattern,
}

/// How cell and column coordinates are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateStyle {
    /// `2,3 (name)`: 1-based row then column
    #[default]
    Numeric,
    /// `C2 (name)`: spreadsheet column letters then 1-based row
    Spreadsheet,
}

/// A leaf of the error tree: one rule that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Name of the rule that produced the failure, e.g. `MaxDigit`
    pub label: String,
    pub kind: FailureKind,
    /// Explanation of the violated condition, free of checked values
    pub message: String,
}

impl Failure {
    pub fn new(label: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Node of the diagnostic tree returned by a failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ErrorNode {
    File {
        name: String,
        message: Option<String>,
        errors: Vec<ErrorNode>,
    },
    Row {
        /// Zero-based physical row index in the source
        index: usize,
        errors: Vec<ErrorNode>,
    },
    Cell {
        row: Option<usize>,
        column: usize,
        name: Option<String>,
        errors: Vec<ErrorNode>,
    },
    Column {
        index: usize,
        name: Option<String>,
        errors: Vec<ErrorNode>,
    },
    Failure(Failure),
}

impl ErrorNode {
    pub fn failure(
        label: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        ErrorNode::Failure(Failure::new(label, kind, message))
    }

    /// Free-form failure appended when a field declares a custom message.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::failure("Custom", FailureKind::Custom, message)
    }

    /// Terminal marker appended when the row error budget is exhausted.
    pub fn max_exceeded(limit: usize) -> Self {
        Self::failure(
            "MaxExceeded",
            FailureKind::MaxExceeded,
            format!("max of {limit} row errors exceeded"),
        )
    }

    pub fn file(name: impl Into<String>, message: Option<String>, errors: Vec<ErrorNode>) -> Self {
        ErrorNode::File {
            name: name.into(),
            message,
            errors,
        }
    }

    pub fn row(index: usize, errors: Vec<ErrorNode>) -> Self {
        ErrorNode::Row { index, errors }
    }

    pub fn cell(row: Option<usize>, column: usize, name: &str, errors: Vec<ErrorNode>) -> Self {
        ErrorNode::Cell {
            row,
            column,
            name: non_empty(name),
            errors,
        }
    }

    pub fn column(index: usize, name: &str, errors: Vec<ErrorNode>) -> Self {
        ErrorNode::Column {
            index,
            name: non_empty(name),
            errors,
        }
    }

    /// Direct children of this node.
    pub fn children(&self) -> &[ErrorNode] {
        match self {
            ErrorNode::File { errors, .. }
            | ErrorNode::Row { errors, .. }
            | ErrorNode::Cell { errors, .. }
            | ErrorNode::Column { errors, .. } => errors,
            ErrorNode::Failure(_) => &[],
        }
    }

    /// Label printed before the colon when rendering. Custom failures have none.
    pub fn label(&self) -> Option<&str> {
        match self {
            ErrorNode::File { .. } => Some("File"),
            ErrorNode::Row { .. } => Some("Row"),
            ErrorNode::Cell { .. } => Some("Cell"),
            ErrorNode::Column { .. } => Some("Column"),
            ErrorNode::Failure(f) if f.kind == FailureKind::Custom => None,
            ErrorNode::Failure(f) => Some(f.label.as_str()),
        }
    }

    /// Message printed after the label.
    pub fn message(&self, style: CoordinateStyle) -> String {
        match self {
            ErrorNode::File { name, message, .. } => match message {
                Some(msg) => format!("{name}; {msg}"),
                None => name.clone(),
            },
            ErrorNode::Row { index, .. } => (index + 1).to_string(),
            ErrorNode::Cell {
                row, column, name, ..
            } => {
                let position = match (style, row) {
                    (CoordinateStyle::Spreadsheet, Some(row)) => {
                        format!("{}{}", column_letters(column + 1), row + 1)
                    }
                    (CoordinateStyle::Spreadsheet, None) => column_letters(column + 1),
                    (CoordinateStyle::Numeric, Some(row)) => format!("{},{}", row + 1, column + 1),
                    (CoordinateStyle::Numeric, None) => (column + 1).to_string(),
                };
                with_name(position, name.as_deref())
            }
            ErrorNode::Column { index, name, .. } => {
                let position = match style {
                    CoordinateStyle::Spreadsheet => column_letters(index + 1),
                    CoordinateStyle::Numeric => (index + 1).to_string(),
                };
                with_name(position, name.as_deref())
            }
            ErrorNode::Failure(f) => f.message.clone(),
        }
    }

    /// Render the tree as an indented markdown list, two spaces per level.
    pub fn to_markdown(&self, style: CoordinateStyle) -> String {
        let mut out = String::new();
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&"  ".repeat(depth));
            out.push_str(" - ");
            if let Some(label) = node.label() {
                out.push_str(label);
                out.push_str(": ");
            }
            out.push_str(&node.message(style));
            for child in node.children().iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// Every node of the tree in pre-order, this node first.
    pub fn flatten(&self) -> Vec<&ErrorNode> {
        let mut nodes = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children().iter().rev());
        }
        nodes
    }

    /// Every rule failure in the tree, in pre-order.
    pub fn failures(&self) -> Vec<&Failure> {
        self.flatten()
            .into_iter()
            .filter_map(|node| match node {
                ErrorNode::Failure(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn has_failure(&self, kind: FailureKind) -> bool {
        self.failures().iter().any(|f| f.kind == kind)
    }

    /// True when any failure was produced by the rule named `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.failures().iter().any(|f| f.label == label)
    }
}

impl fmt::Display for ErrorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown(CoordinateStyle::default()))
    }
}

/// The aggregated outcome of a failed file check.
///
/// Wraps the `File` root of the tree together with the coordinate style chosen
/// for the run, so that `Display` prints what the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    root: ErrorNode,
    style: CoordinateStyle,
}

impl FileError {
    pub fn new(
        name: impl Into<String>,
        message: Option<String>,
        errors: Vec<ErrorNode>,
        style: CoordinateStyle,
    ) -> Self {
        Self {
            root: ErrorNode::file(name, message, errors),
            style,
        }
    }

    pub fn root(&self) -> &ErrorNode {
        &self.root
    }

    /// Top-level errors under the `File` node.
    pub fn errors(&self) -> &[ErrorNode] {
        self.root.children()
    }

    pub fn style(&self) -> CoordinateStyle {
        self.style
    }

    pub fn flatten(&self) -> Vec<&ErrorNode> {
        self.root.flatten()
    }

    pub fn failures(&self) -> Vec<&Failure> {
        self.root.failures()
    }

    pub fn has_failure(&self, kind: FailureKind) -> bool {
        self.root.has_failure(kind)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.root.has_label(label)
    }

    pub fn to_markdown(&self) -> String {
        self.root.to_markdown(self.style)
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

impl std::error::Error for FileError {}

/// Spreadsheet column name for a 1-based column number (`1 → A`, `27 → AA`).
pub fn column_letters(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn non_empty(name: &str) -> Option<String> {
    (!name.is_empty()).then(|| name.to_string())
}

fn with_name(position: String, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{position} ({name})"),
        None => position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> FileError {
        FileError::new(
            "data.csv",
            None,
            vec![
                ErrorNode::row(
                    1,
                    vec![ErrorNode::cell(
                        Some(1),
                        1,
                        "c2",
                        vec![ErrorNode::failure(
                            "MaxDigit",
                            FailureKind::Length(LengthBound::Max),
                            "must have no more than 1 digit characters",
                        )],
                    )],
                ),
                ErrorNode::column(
                    0,
                    "c1",
                    vec![ErrorNode::failure(
                        "Unique",
                        FailureKind::DuplicateValue,
                        "values must be unique",
                    )],
                ),
            ],
            CoordinateStyle::Numeric,
        )
    }

    #[test]
    fn test_markdown_rendering() {
        let expected = " - File: data.csv\n   - Row: 2\n     - Cell: 2,2 (c2)\n       - MaxDigit: must have no more than 1 digit characters\n   - Column: 1 (c1)\n     - Unique: values must be unique";
        assert_eq!(sample_tree().to_string(), expected);
    }

    #[test]
    fn test_custom_failure_has_no_label() {
        let node = ErrorNode::cell(None, 0, "", vec![ErrorNode::custom("Testing")]);
        assert_eq!(node.to_string(), " - Cell: 1\n   - Testing");
    }

    #[test]
    fn test_file_message_suffix() {
        let node = ErrorNode::file("a.csv", Some("bad input".to_string()), vec![]);
        assert_eq!(node.to_string(), " - File: a.csv; bad input");
    }

    #[test]
    fn test_spreadsheet_coordinates() {
        let node = ErrorNode::cell(Some(0), 0, "", vec![]);
        assert_eq!(node.to_markdown(CoordinateStyle::Spreadsheet), " - Cell: A1");

        let node = ErrorNode::cell(Some(9), 27, "total", vec![]);
        assert_eq!(
            node.to_markdown(CoordinateStyle::Spreadsheet),
            " - Cell: AB10 (total)"
        );
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(1234), "AUL");
        assert_eq!(column_letters(16384), "XFD");
    }

    #[test]
    fn test_flatten_is_preorder() {
        let tree = sample_tree();
        let labels: Vec<_> = tree.flatten().iter().filter_map(|n| n.label()).collect();
        assert_eq!(
            labels,
            vec!["File", "Row", "Cell", "MaxDigit", "Column", "Unique"]
        );
    }

    #[test]
    fn test_search_by_kind_and_label() {
        let tree = sample_tree();
        assert!(tree.has_failure(FailureKind::DuplicateValue));
        assert!(tree.has_failure(FailureKind::Length(LengthBound::Max)));
        assert!(!tree.has_failure(FailureKind::NullValue));
        assert!(tree.has_label("MaxDigit"));
        assert_eq!(tree.failures().len(), 2);
    }
}
