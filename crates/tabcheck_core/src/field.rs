//! Column definitions.
//!
//! A [`Field`] bundles the cell rules, column rules and documentation of one
//! schema column. Fields are built with [`FieldBuilder`], whose constructors
//! pre-load the rules of the common data types.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ErrorNode;
use crate::rule::{CellData, Comparison, Rule, RuleError};
use crate::rules::{
    Blank, CanBeDateIso, CanBeInteger, Choice, DateComparison, ISO_DATE_FORMAT, MaxChar,
    MaxDigit, MinChar, MinDigit, NoLeadingZero, NotNull, NumericDecimals, OnlyNumbers, Unique,
};
use crate::subject::{DebugPolicy, Subject, pre_processing_failure};

/// The data type a field was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// No type rules, only what the caller registers
    #[default]
    Any,
    Text,
    Integer,
    Digit,
    Currency,
    Date,
    Choice,
    /// Never checked, and counts as blank for empty-row detection
    Ignore,
    /// Values must be blank
    Empty,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Any => "any",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Digit => "digit",
            FieldType::Currency => "currency",
            FieldType::Date => "date",
            FieldType::Choice => "choice",
            FieldType::Ignore => "ignore",
            FieldType::Empty => "empty",
        };
        f.write_str(name)
    }
}

type Preprocessor = dyn Fn(&str) -> Result<String, RuleError> + Send + Sync;

/// Validation definition of one column.
pub struct Field {
    field_type: FieldType,
    nullable: bool,
    strip: bool,
    preprocessor: Option<Box<Preprocessor>>,
    cells: Subject<CellData>,
    columns: Subject<[String]>,
}

impl Field {
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_ignored(&self) -> bool {
        self.field_type == FieldType::Ignore
    }

    pub fn cell_rules(&self) -> &Subject<CellData> {
        &self.cells
    }

    pub fn column_rules(&self) -> &Subject<[String]> {
        &self.columns
    }

    /// Whether values of this field must be kept for a column pass.
    pub fn has_column_rules(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Sibling fields this field's rules read from the same row.
    pub fn comparison_columns(&self) -> BTreeSet<&str> {
        self.cells
            .rules()
            .filter_map(|r| r.comparison_column())
            .collect()
    }

    /// Check one cell and return the failures, empty on pass.
    ///
    /// A nullable field accepts an empty value without running any rule.
    pub fn check_cell(&self, cell: &CellData, debug: DebugPolicy) -> Vec<ErrorNode> {
        if self.is_ignored() || (self.nullable && cell.value().is_empty()) {
            return Vec::new();
        }
        let cell = match self.pre_process(cell) {
            Ok(cell) => cell,
            Err(err) => return vec![pre_processing_failure(&err, debug)],
        };
        if self.nullable && cell.value().is_empty() {
            return Vec::new();
        }
        self.cells.check(&cell, debug)
    }

    /// Shorthand for checking a bare value with sanitized messages.
    pub fn check_value(&self, value: &str) -> Vec<ErrorNode> {
        self.check_cell(&CellData::new(value), DebugPolicy::Sanitized)
    }

    /// Run the column rules against every collected value of this field.
    pub fn check_column(&self, values: &[String], debug: DebugPolicy) -> Vec<ErrorNode> {
        self.columns.check(values, debug)
    }

    fn pre_process<'a>(&self, cell: &'a CellData) -> Result<Cow<'a, CellData>, RuleError> {
        if !self.strip && self.preprocessor.is_none() {
            return Ok(Cow::Borrowed(cell));
        }
        let mut value = if self.strip {
            cell.value().trim().to_string()
        } else {
            cell.value().to_string()
        };
        if let Some(preprocess) = &self.preprocessor {
            value = preprocess(&value)?;
        }
        Ok(Cow::Owned(cell.replace_value(value)))
    }

    /// Documentation lines: descriptors, rule explanations, then `Nullable`.
    pub fn digest(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .cells
            .descriptors()
            .iter()
            .map(|(key, value)| match value {
                Some(value) => format!("{key}: {value}"),
                None => key.clone(),
            })
            .collect();
        lines.extend(self.cells.explain());
        lines.extend(self.columns.explain());
        if self.nullable {
            lines.push("Nullable".to_string());
        }
        lines
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("field_type", &self.field_type)
            .field("nullable", &self.nullable)
            .field("strip", &self.strip)
            .field("cells", &self.cells)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
enum Shape {
    Any,
    Text {
        max: usize,
        min: Option<usize>,
    },
    Integer {
        max: usize,
        min: Option<usize>,
    },
    Digit {
        max: usize,
        min: Option<usize>,
    },
    Currency {
        significant_digits: usize,
        decimals: usize,
    },
    Date {
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
        truncate_time: bool,
    },
    Choice {
        choices: Vec<String>,
        case_insensitive: bool,
    },
    Ignore,
    Empty,
}

/// Builder for [`Field`].
///
/// ```rust
/// use tabcheck_core::FieldBuilder;
///
/// let field = FieldBuilder::integer(3).min_length(1).unique().build();
/// assert!(field.check_value("42").is_empty());
/// assert!(!field.check_value("042").is_empty());
/// ```
pub struct FieldBuilder {
    shape: Shape,
    nullable: bool,
    strip: bool,
    all_errors: bool,
    custom_error: Option<String>,
    preprocessor: Option<Box<Preprocessor>>,
    cells: Subject<CellData>,
    columns: Subject<[String]>,
    descriptors: Vec<(String, Option<String>)>,
}

impl FieldBuilder {
    fn with_shape(shape: Shape) -> Self {
        let nullable = matches!(shape, Shape::Ignore | Shape::Empty);
        Self {
            shape,
            nullable,
            strip: false,
            all_errors: true,
            custom_error: None,
            preprocessor: None,
            cells: Subject::new(),
            columns: Subject::new(),
            descriptors: Vec::new(),
        }
    }

    /// A field with no type rules.
    pub fn any() -> Self {
        Self::with_shape(Shape::Any)
    }

    /// Free text of at most `max` characters.
    pub fn text(max: usize) -> Self {
        Self::with_shape(Shape::Text { max, min: None })
    }

    /// Signed integer of at most `max` digits, without leading zeros.
    pub fn integer(max: usize) -> Self {
        Self::with_shape(Shape::Integer { max, min: None })
    }

    /// String of at most `max` ASCII digits (leading zeros allowed).
    pub fn digit(max: usize) -> Self {
        Self::with_shape(Shape::Digit { max, min: None })
    }

    /// Decimal amount with at most `significant_digits` digits, two of them
    /// after the point unless [`decimals`](Self::decimals) says otherwise.
    pub fn currency(significant_digits: usize) -> Self {
        Self::with_shape(Shape::Currency {
            significant_digits,
            decimals: 2,
        })
    }

    /// ISO-8601 date (`YYYY-MM-DD`).
    pub fn date() -> Self {
        Self::with_shape(Shape::Date {
            min: None,
            max: None,
            truncate_time: false,
        })
    }

    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_shape(Shape::Choice {
            choices: choices.into_iter().map(Into::into).collect(),
            case_insensitive: false,
        })
    }

    pub fn ignore() -> Self {
        Self::with_shape(Shape::Ignore)
    }

    pub fn empty() -> Self {
        Self::with_shape(Shape::Empty)
    }

    /// Lower length bound for text, integer and digit fields. Ignored otherwise.
    pub fn min_length(mut self, min_length: usize) -> Self {
        match &mut self.shape {
            Shape::Text { min, .. } | Shape::Integer { min, .. } | Shape::Digit { min, .. } => {
                *min = Some(min_length);
            }
            _ => {}
        }
        self
    }

    /// Allowed digits after the decimal point for currency fields.
    pub fn decimals(mut self, count: usize) -> Self {
        if let Shape::Currency { decimals, .. } = &mut self.shape {
            *decimals = count;
        }
        self
    }

    pub fn min_date(mut self, date: NaiveDate) -> Self {
        if let Shape::Date { min, .. } = &mut self.shape {
            *min = Some(date);
        }
        self
    }

    pub fn max_date(mut self, date: NaiveDate) -> Self {
        if let Shape::Date { max, .. } = &mut self.shape {
            *max = Some(date);
        }
        self
    }

    /// Accept `YYYY-MM-DD 00:00:00` as a plain date.
    pub fn truncate_time(mut self, truncate: bool) -> Self {
        if let Shape::Date { truncate_time, .. } = &mut self.shape {
            *truncate_time = truncate;
        }
        self
    }

    pub fn case_insensitive(mut self, insensitive: bool) -> Self {
        if let Shape::Choice {
            case_insensitive, ..
        } = &mut self.shape
        {
            *case_insensitive = insensitive;
        }
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Trim surrounding whitespace before rules run.
    pub fn strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    pub fn all_errors(mut self, all_errors: bool) -> Self {
        self.all_errors = all_errors;
        self
    }

    pub fn custom_error(mut self, message: impl Into<String>) -> Self {
        self.custom_error = Some(message.into());
        self
    }

    /// Fallible transformation applied to every value before rules run.
    pub fn pre_process<F>(mut self, preprocess: F) -> Self
    where
        F: Fn(&str) -> Result<String, RuleError> + Send + Sync + 'static,
    {
        self.preprocessor = Some(Box::new(preprocess));
        self
    }

    pub fn rule<R>(mut self, rule: R) -> Self
    where
        R: Rule<CellData> + 'static,
    {
        self.cells.push(rule);
        self
    }

    pub fn column_rule<R>(mut self, rule: R) -> Self
    where
        R: Rule<[String]> + 'static,
    {
        self.columns.push(rule);
        self
    }

    /// Non-blank values must not repeat across the file.
    pub fn unique(self) -> Self {
        self.column_rule(Unique)
    }

    /// Extra documentation descriptor.
    pub fn describe(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.descriptors.push((key.into(), value));
        self
    }

    pub fn build(self) -> Field {
        let mut cells = Subject::new();
        if !self.nullable {
            cells.push(NotNull);
        }
        let field_type = shape_rules(&self.shape, &mut cells);
        for (key, value) in self.descriptors {
            cells.describe(key, value);
        }
        for rule in self.cells.into_rules() {
            cells.push_boxed(rule);
        }
        cells.set_all_errors(self.all_errors);
        cells.set_custom_error(self.custom_error);

        Field {
            field_type,
            nullable: self.nullable,
            strip: self.strip,
            preprocessor: self.preprocessor,
            cells,
            columns: self.columns,
        }
    }
}

impl From<FieldBuilder> for Field {
    fn from(builder: FieldBuilder) -> Self {
        builder.build()
    }
}

/// Push the rules and descriptors of a data type.
fn shape_rules(shape: &Shape, cells: &mut Subject<CellData>) -> FieldType {
    match shape {
        Shape::Any => FieldType::Any,
        Shape::Text { max, min } => {
            cells.describe("Type", Some("String".to_string()));
            cells.describe("Max Length", Some(format!("{max} characters")));
            cells.push(MaxChar(*max));
            if let Some(min) = min {
                cells.describe("Min Length", Some(format!("{min} characters")));
                cells.push(MinChar(*min));
            }
            FieldType::Text
        }
        Shape::Integer { max, min } => {
            cells.describe("Type", Some("Numeric".to_string()));
            cells.describe("Format", Some("9".repeat(*max)));
            cells.describe("Max Length", Some(format!("{max} digits")));
            cells.push(CanBeInteger);
            cells.push(NoLeadingZero);
            cells.push(MaxDigit(*max));
            if let Some(min) = min {
                cells.describe("Min Length", Some(format!("{min} digits")));
                cells.push(MinDigit(*min));
            }
            FieldType::Integer
        }
        Shape::Digit { max, min } => {
            cells.describe("Type", Some("String".to_string()));
            cells.describe("Format", Some("0".repeat(*max)));
            cells.describe("Max Length", Some(format!("{max} digits")));
            cells.push(OnlyNumbers);
            cells.push(MaxChar(*max));
            if let Some(min) = min {
                cells.describe("Min Length", Some(format!("{min} digits")));
                cells.push(MinChar(*min));
            }
            FieldType::Digit
        }
        Shape::Currency {
            significant_digits,
            decimals,
        } => {
            let whole = significant_digits.saturating_sub(*decimals);
            cells.describe("Type", Some("Numeric".to_string()));
            cells.describe(
                "Format",
                Some(format!("{}.{}", "9".repeat(whole), "9".repeat(*decimals))),
            );
            cells.describe("Max Length", Some(format!("{significant_digits} digits")));
            cells.push(MaxDigit(*significant_digits));
            cells.push(NumericDecimals::new(*decimals));
            FieldType::Currency
        }
        Shape::Date {
            min,
            max,
            truncate_time,
        } => {
            cells.describe("Type", Some("Date".to_string()));
            cells.describe("Format", Some("YYYY-MM-DD".to_string()));
            cells.push(CanBeDateIso::new(*truncate_time));
            if let Some(max) = max {
                cells.describe("Max Date", Some(max.format(ISO_DATE_FORMAT).to_string()));
                cells.push(
                    DateComparison::new(Comparison::Lte, *max).truncate_time(*truncate_time),
                );
            }
            if let Some(min) = min {
                cells.describe("Min Date", Some(min.format(ISO_DATE_FORMAT).to_string()));
                cells.push(
                    DateComparison::new(Comparison::Gte, *min).truncate_time(*truncate_time),
                );
            }
            FieldType::Date
        }
        Shape::Choice {
            choices,
            case_insensitive,
        } => {
            cells.describe("Type", Some("Choice".to_string()));
            cells.describe("Choices", Some(choices.join(",")));
            cells.push(Choice::new(choices.iter().cloned(), *case_insensitive));
            FieldType::Choice
        }
        Shape::Ignore => {
            cells.describe("Type", Some("Ignored".to_string()));
            FieldType::Ignore
        }
        Shape::Empty => {
            cells.describe("Type", Some("Empty".to_string()));
            cells.push(Blank);
            FieldType::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureKind, LengthBound};
    use crate::rule::make_static_cell_rule;
    use crate::rules::ColumnComparison;
    use pretty_assertions::assert_eq;

    fn kinds(failures: &[ErrorNode]) -> Vec<FailureKind> {
        failures
            .iter()
            .filter_map(|n| match n {
                ErrorNode::Failure(f) => Some(f.kind),
                _ => None,
            })
            .collect()
    }

    fn typed_builders() -> Vec<FieldBuilder> {
        vec![
            FieldBuilder::any(),
            FieldBuilder::text(3).min_length(2),
            FieldBuilder::integer(2),
            FieldBuilder::digit(4),
            FieldBuilder::currency(5),
            FieldBuilder::date(),
            FieldBuilder::choice(["a", "b"]),
        ]
    }

    #[test]
    fn test_non_nullable_empty_is_null_value() {
        for builder in typed_builders() {
            let failures = builder.build().check_value("");
            assert_eq!(kinds(&failures)[0], FailureKind::NullValue);
        }
        for builder in typed_builders() {
            let field = builder.all_errors(false).build();
            assert_eq!(kinds(&field.check_value("")), vec![FailureKind::NullValue]);
        }
    }

    #[test]
    fn test_nullable_empty_skips_every_rule() {
        let field = FieldBuilder::text(3)
            .min_length(2)
            .nullable(true)
            .rule(make_static_cell_rule(|_| Ok(false), "never holds", FailureKind::Custom))
            .build();
        assert!(field.check_value("").is_empty());
        assert!(!field.check_value("x").is_empty());
    }

    #[test]
    fn test_integer_values() {
        let field = FieldBuilder::integer(3).build();
        for ok in ["0", "7", "-42", "999"] {
            assert!(field.check_value(ok).is_empty(), "{ok} should pass");
        }
        assert_eq!(kinds(&field.check_value("01")), vec![FailureKind::LeadingZero]);
        assert_eq!(kinds(&field.check_value("-007")), vec![FailureKind::LeadingZero]);
        assert_eq!(
            kinds(&field.check_value("1234")),
            vec![FailureKind::Length(LengthBound::Max)]
        );
        assert!(kinds(&field.check_value("1.5")).contains(&FailureKind::Conversion));
    }

    #[test]
    fn test_integer_min_length_uses_digits() {
        let field = FieldBuilder::integer(4).min_length(2).build();
        assert!(field.check_value("-12").is_empty());
        assert_eq!(
            kinds(&field.check_value("-1")),
            vec![FailureKind::Length(LengthBound::Min)]
        );
    }

    #[test]
    fn test_digit_allows_leading_zeros() {
        let field = FieldBuilder::digit(4).min_length(4).build();
        assert!(field.check_value("0012").is_empty());
        assert_eq!(kinds(&field.check_value("12a4")), vec![FailureKind::Character]);
        assert_eq!(
            kinds(&field.check_value("012")),
            vec![FailureKind::Length(LengthBound::Min)]
        );
    }

    #[test]
    fn test_currency() {
        let field = FieldBuilder::currency(5).build();
        assert!(field.check_value("123.45").is_empty());
        assert!(field.check_value("-1.5").is_empty());
        assert_eq!(
            kinds(&field.check_value("1.234")),
            vec![FailureKind::CurrencyPattern]
        );
        assert_eq!(
            kinds(&field.check_value("123456")),
            vec![FailureKind::Length(LengthBound::Max)]
        );
        let precise = FieldBuilder::currency(8).decimals(4).build();
        assert!(precise.check_value("1.2345").is_empty());
    }

    #[test]
    fn test_date_bounds_and_truncation() {
        let field = FieldBuilder::date()
            .min_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
            .max_date(NaiveDate::from_ymd_opt(2020, 12, 31).unwrap())
            .truncate_time(true)
            .build();
        assert!(field.check_value("2020-06-01").is_empty());
        assert!(field.check_value("2020-06-01 00:00:00").is_empty());
        assert_eq!(
            kinds(&field.check_value("2021-01-01")),
            vec![FailureKind::ValueComparison]
        );
        assert_eq!(
            kinds(&field.check_value("2020-13-01")),
            vec![
                FailureKind::Conversion,
                FailureKind::ValueComparison,
                FailureKind::ValueComparison
            ]
        );
    }

    #[test]
    fn test_choice_and_strip() {
        let field = FieldBuilder::choice(["Yes", "No"])
            .case_insensitive(true)
            .strip(true)
            .build();
        assert!(field.check_value("  yes ").is_empty());
        assert_eq!(kinds(&field.check_value("maybe")), vec![FailureKind::InvalidChoice]);
        assert_eq!(
            kinds(&field.check_value("   ")),
            vec![FailureKind::NullValue, FailureKind::InvalidChoice]
        );
    }

    #[test]
    fn test_ignore_and_empty_fields() {
        let ignore = FieldBuilder::ignore().build();
        assert!(ignore.is_ignored());
        assert!(ignore.check_value("anything").is_empty());

        let empty = FieldBuilder::empty().build();
        assert!(empty.check_value("").is_empty());
        assert_eq!(
            kinds(&empty.check_value("x")),
            vec![FailureKind::Length(LengthBound::Exact)]
        );
    }

    #[test]
    fn test_pre_process_failure_is_terminal() {
        let field = FieldBuilder::text(5)
            .pre_process(|v| {
                v.strip_prefix('#')
                    .map(str::to_string)
                    .ok_or_else(|| RuleError::new("MissingPrefix", format!("{v} lacks '#'")))
            })
            .build();
        assert!(field.check_value("#abc").is_empty());
        let failures = field.check_value("toolongvalue");
        assert_eq!(kinds(&failures), vec![FailureKind::PreProcessing]);
        assert!(!failures[0].to_string().contains("toolongvalue"));
    }

    #[test]
    fn test_custom_error_message() {
        let field = FieldBuilder::text(1).custom_error("Testing").build();
        let failures = field.check_value("abc");
        assert_eq!(failures.last(), Some(&ErrorNode::custom("Testing")));
        assert!(field.check_value("a").is_empty());
    }

    #[test]
    fn test_comparison_columns() {
        let field = FieldBuilder::integer(2)
            .rule(ColumnComparison::greater_than("b"))
            .rule(ColumnComparison::new(Comparison::Lt, "c"))
            .build();
        assert_eq!(field.comparison_columns(), BTreeSet::from(["b", "c"]));
        assert!(FieldBuilder::text(1).build().comparison_columns().is_empty());
    }

    #[test]
    fn test_digest() {
        let field = FieldBuilder::integer(3).nullable(true).unique().build();
        assert_eq!(
            field.digest(),
            vec![
                "Type: Numeric",
                "Format: 999",
                "Max Length: 3 digits",
                "can be coerced into an integer value",
                "cannot have a leading zero digit",
                "must have no more than 3 digit characters",
                "values must be unique",
                "Nullable",
            ]
        );
        assert_eq!(
            FieldBuilder::any().build().digest(),
            vec!["cannot be empty/blank"]
        );
        assert_eq!(
            FieldBuilder::currency(5).build().digest()[1],
            "Format: 999.99"
        );
    }
}
