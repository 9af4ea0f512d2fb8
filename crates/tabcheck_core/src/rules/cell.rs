//! Rules over a single cell value.

use chrono::NaiveDate;

use crate::error::{FailureKind, LengthBound};
use crate::rule::{CellData, Comparison, Rule, RuleError, RuleScope};

/// Date format accepted by date rules.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

fn char_count(cell: &CellData) -> usize {
    cell.value().chars().count()
}

fn digit_count(cell: &CellData) -> usize {
    cell.value().chars().filter(char::is_ascii_digit).count()
}

/// Drop a trailing midnight timestamp (`2020-01-01 00:00:00` → `2020-01-01`).
pub fn truncate_midnight(value: &str) -> &str {
    value
        .strip_suffix(" 00:00:00")
        .or_else(|| value.strip_suffix("T00:00:00"))
        .unwrap_or(value)
}

fn parse_iso_date(value: &str, truncate_time: bool) -> Option<NaiveDate> {
    let value = if truncate_time {
        truncate_midnight(value)
    } else {
        value
    };
    NaiveDate::parse_from_str(value, ISO_DATE_FORMAT).ok()
}

/// Value must not be empty. Fields insert it first unless nullable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotNull;

impl Rule<CellData> for NotNull {
    type Prepared = bool;

    fn name(&self) -> String {
        "NotNull".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::NullValue
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<bool, RuleError> {
        Ok(cell.value().is_empty())
    }

    fn evaluate(&self, is_empty: bool) -> bool {
        !is_empty
    }

    fn explain(&self) -> String {
        "cannot be empty/blank".to_string()
    }
}

/// Value must be empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blank;

impl Rule<CellData> for Blank {
    type Prepared = usize;

    fn name(&self) -> String {
        "Blank".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Length(LengthBound::Exact)
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<usize, RuleError> {
        Ok(char_count(cell))
    }

    fn evaluate(&self, length: usize) -> bool {
        length == 0
    }

    fn explain(&self) -> String {
        "must be empty/blank".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExactChar(pub usize);

impl Rule<CellData> for ExactChar {
    type Prepared = usize;

    fn name(&self) -> String {
        "ExactChar".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Length(LengthBound::Exact)
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<usize, RuleError> {
        Ok(char_count(cell))
    }

    fn evaluate(&self, length: usize) -> bool {
        length == self.0
    }

    fn explain(&self) -> String {
        format!("must be exactly {} characters", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MinChar(pub usize);

impl Rule<CellData> for MinChar {
    type Prepared = usize;

    fn name(&self) -> String {
        "MinChar".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Length(LengthBound::Min)
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<usize, RuleError> {
        Ok(char_count(cell))
    }

    fn evaluate(&self, length: usize) -> bool {
        length >= self.0
    }

    fn explain(&self) -> String {
        format!("must be at least {} characters", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MaxChar(pub usize);

impl Rule<CellData> for MaxChar {
    type Prepared = usize;

    fn name(&self) -> String {
        "MaxChar".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Length(LengthBound::Max)
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<usize, RuleError> {
        Ok(char_count(cell))
    }

    fn evaluate(&self, length: usize) -> bool {
        length <= self.0
    }

    fn explain(&self) -> String {
        format!("must be no more than {} characters", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiChar;

impl Rule<CellData> for AsciiChar {
    type Prepared = bool;

    fn name(&self) -> String {
        "AsciiChar".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Character
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<bool, RuleError> {
        Ok(cell.value().is_ascii())
    }

    fn evaluate(&self, is_ascii: bool) -> bool {
        is_ascii
    }

    fn explain(&self) -> String {
        "must have only ASCII characters".to_string()
    }
}

/// Value must be one of a fixed set.
///
/// With `case_insensitive`, both the value and the choices are lower-cased
/// before comparing. The explanation always lists the choices as declared.
#[derive(Debug, Clone)]
pub struct Choice {
    choices: Vec<String>,
    folded: Vec<String>,
    case_insensitive: bool,
}

impl Choice {
    pub fn new<I, S>(choices: I, case_insensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        let folded = if case_insensitive {
            choices.iter().map(|c| c.to_lowercase()).collect()
        } else {
            choices.clone()
        };
        Self {
            choices,
            folded,
            case_insensitive,
        }
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }
}

impl Rule<CellData> for Choice {
    type Prepared = String;

    fn name(&self) -> String {
        "Choice".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::InvalidChoice
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<String, RuleError> {
        Ok(if self.case_insensitive {
            cell.value().to_lowercase()
        } else {
            cell.value().to_string()
        })
    }

    fn evaluate(&self, value: String) -> bool {
        self.folded.contains(&value)
    }

    fn explain(&self) -> String {
        let sensitivity = if self.case_insensitive {
            "case insensitive"
        } else {
            "case sensitive"
        };
        format!(
            "must be one of [{}] ({sensitivity})",
            self.choices.join(", ")
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MinDigit(pub usize);

impl Rule<CellData> for MinDigit {
    type Prepared = usize;

    fn name(&self) -> String {
        "MinDigit".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Length(LengthBound::Min)
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<usize, RuleError> {
        Ok(digit_count(cell))
    }

    fn evaluate(&self, digits: usize) -> bool {
        digits >= self.0
    }

    fn explain(&self) -> String {
        format!("must have at least {} digit characters", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MaxDigit(pub usize);

impl Rule<CellData> for MaxDigit {
    type Prepared = usize;

    fn name(&self) -> String {
        "MaxDigit".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Length(LengthBound::Max)
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<usize, RuleError> {
        Ok(digit_count(cell))
    }

    fn evaluate(&self, digits: usize) -> bool {
        digits <= self.0
    }

    fn explain(&self) -> String {
        format!("must have no more than {} digit characters", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OnlyNumbers;

impl Rule<CellData> for OnlyNumbers {
    type Prepared = bool;

    fn name(&self) -> String {
        "OnlyNumbers".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Character
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<bool, RuleError> {
        let value = cell.value();
        Ok(!value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
    }

    fn evaluate(&self, only_digits: bool) -> bool {
        only_digits
    }

    fn explain(&self) -> String {
        "must only contain characters 0-9".to_string()
    }
}

/// The digits of the value, read as a number, must not start with `0`
/// unless the number is exactly `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLeadingZero;

impl Rule<CellData> for NoLeadingZero {
    type Prepared = String;

    fn name(&self) -> String {
        "NoLeadingZero".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::LeadingZero
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<String, RuleError> {
        Ok(cell.value().chars().filter(char::is_ascii_digit).collect())
    }

    fn evaluate(&self, digits: String) -> bool {
        digits == "0" || digits.starts_with(|c: char| ('1'..='9').contains(&c))
    }

    fn explain(&self) -> String {
        "cannot have a leading zero digit".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CanBeFloat;

impl Rule<CellData> for CanBeFloat {
    type Prepared = bool;

    fn name(&self) -> String {
        "CanBeFloat".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Conversion
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<bool, RuleError> {
        Ok(cell.value().parse::<f64>().is_ok())
    }

    fn evaluate(&self, parsed: bool) -> bool {
        parsed
    }

    fn explain(&self) -> String {
        "can be coerced into a float value".to_string()
    }
}

/// Optional sign followed by at least one ASCII digit. No width limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanBeInteger;

impl Rule<CellData> for CanBeInteger {
    type Prepared = bool;

    fn name(&self) -> String {
        "CanBeInteger".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Conversion
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<bool, RuleError> {
        let value = cell.value();
        let digits = value
            .strip_prefix(['+', '-'])
            .unwrap_or(value);
        Ok(!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    }

    fn evaluate(&self, parsed: bool) -> bool {
        parsed
    }

    fn explain(&self) -> String {
        "can be coerced into an integer value".to_string()
    }
}

/// Signed decimal with at most `max_decimals` digits after the point.
#[derive(Debug, Clone, Copy)]
pub struct NumericDecimals {
    max_decimals: usize,
}

impl NumericDecimals {
    pub fn new(max_decimals: usize) -> Self {
        Self { max_decimals }
    }
}

impl Default for NumericDecimals {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Rule<CellData> for NumericDecimals {
    type Prepared = bool;

    fn name(&self) -> String {
        "NumericDecimals".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::CurrencyPattern
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<bool, RuleError> {
        let value = cell.value();
        let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (unsigned, None),
        };
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        let fraction_ok = fraction
            .is_none_or(|f| all_digits(f) && f.len() <= self.max_decimals);
        Ok(all_digits(whole) && fraction_ok)
    }

    fn evaluate(&self, matches: bool) -> bool {
        matches
    }

    fn explain(&self) -> String {
        format!(
            "cannot have more than {} digits after the decimal point",
            self.max_decimals
        )
    }
}

/// Compares the character length of the value against a threshold.
#[derive(Debug, Clone, Copy)]
pub struct LengthComparison {
    op: Comparison,
    length: usize,
}

impl LengthComparison {
    pub fn new(op: Comparison, length: usize) -> Self {
        Self { op, length }
    }
}

impl Rule<CellData> for LengthComparison {
    type Prepared = usize;

    fn name(&self) -> String {
        format!("Length{}", self.op.suffix())
    }

    fn kind(&self) -> FailureKind {
        FailureKind::ValueComparison
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<usize, RuleError> {
        Ok(char_count(cell))
    }

    fn evaluate(&self, length: usize) -> bool {
        self.op.holds(&length, &self.length)
    }

    fn explain(&self) -> String {
        format!("length must be {} {}", self.op, self.length)
    }
}

/// Compares the value, read as a float, against a threshold.
///
/// An unparsable value is an unexpected error for this rule, not a plain
/// `false`: pair it with [`CanBeFloat`] to get a conversion failure.
#[derive(Debug, Clone, Copy)]
pub struct NumericComparison {
    op: Comparison,
    value: f64,
}

impl NumericComparison {
    pub fn new(op: Comparison, value: f64) -> Self {
        Self { op, value }
    }
}

impl Rule<CellData> for NumericComparison {
    type Prepared = f64;

    fn name(&self) -> String {
        format!("Numeric{}", self.op.suffix())
    }

    fn kind(&self) -> FailureKind {
        FailureKind::ValueComparison
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<f64, RuleError> {
        Ok(cell.value().parse::<f64>()?)
    }

    fn evaluate(&self, number: f64) -> bool {
        self.op.holds(&number, &self.value)
    }

    fn explain(&self) -> String {
        format!("must be {} {}", self.op, self.value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CanBeDateIso {
    truncate_time: bool,
}

impl CanBeDateIso {
    pub fn new(truncate_time: bool) -> Self {
        Self { truncate_time }
    }
}

impl Rule<CellData> for CanBeDateIso {
    type Prepared = Option<NaiveDate>;

    fn name(&self) -> String {
        "CanBeDateIso".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::Conversion
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<Option<NaiveDate>, RuleError> {
        Ok(parse_iso_date(cell.value(), self.truncate_time))
    }

    fn evaluate(&self, date: Option<NaiveDate>) -> bool {
        date.is_some()
    }

    fn explain(&self) -> String {
        "can be coerced into an ISO-8601 date (YYYY-MM-DD)".to_string()
    }
}

/// Compares an ISO date against a fixed date. Unparsable values fail.
#[derive(Debug, Clone, Copy)]
pub struct DateComparison {
    op: Comparison,
    date: NaiveDate,
    truncate_time: bool,
}

impl DateComparison {
    pub fn new(op: Comparison, date: NaiveDate) -> Self {
        Self {
            op,
            date,
            truncate_time: false,
        }
    }

    pub fn truncate_time(mut self, truncate: bool) -> Self {
        self.truncate_time = truncate;
        self
    }
}

impl Rule<CellData> for DateComparison {
    type Prepared = Option<NaiveDate>;

    fn name(&self) -> String {
        format!("Date{}", self.op.suffix())
    }

    fn kind(&self) -> FailureKind {
        FailureKind::ValueComparison
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<Option<NaiveDate>, RuleError> {
        Ok(parse_iso_date(cell.value(), self.truncate_time))
    }

    fn evaluate(&self, date: Option<NaiveDate>) -> bool {
        date.is_some_and(|d| self.op.holds(&d, &self.date))
    }

    fn explain(&self) -> String {
        format!("must be {} {}", self.op, self.date.format(ISO_DATE_FORMAT))
    }
}

/// Compares the value against another column of the same row.
///
/// Both sides are compared as numbers when they both parse, otherwise as
/// strings.
#[derive(Debug, Clone)]
pub struct ColumnComparison {
    op: Comparison,
    column: String,
}

impl ColumnComparison {
    pub fn new(op: Comparison, column: impl Into<String>) -> Self {
        Self {
            op,
            column: column.into(),
        }
    }

    pub fn greater_than(column: impl Into<String>) -> Self {
        Self::new(Comparison::Gt, column)
    }
}

impl Rule<CellData> for ColumnComparison {
    type Prepared = (String, String);

    fn name(&self) -> String {
        match self.op {
            Comparison::Gt => "GreaterThanColumn".to_string(),
            Comparison::Gte => "GreaterThanOrEqualColumn".to_string(),
            Comparison::Eq => "EqualToColumn".to_string(),
            Comparison::Lte => "LessThanOrEqualColumn".to_string(),
            Comparison::Lt => "LessThanColumn".to_string(),
        }
    }

    fn kind(&self) -> FailureKind {
        FailureKind::ColumnComparison
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Cell
    }

    fn prepare(&self, cell: &CellData) -> Result<(String, String), RuleError> {
        let other = cell.compared(&self.column).ok_or_else(|| {
            RuleError::new(
                "MissingComparisonValue",
                format!("row has no value for column '{}'", self.column),
            )
        })?;
        Ok((cell.value().to_string(), other.to_string()))
    }

    fn evaluate(&self, (value, other): (String, String)) -> bool {
        match (value.parse::<f64>(), other.parse::<f64>()) {
            (Ok(left), Ok(right)) => self.op.holds(&left, &right),
            _ => self.op.holds(&value, &other),
        }
    }

    fn explain(&self) -> String {
        format!("must be {} column '{}'", self.op, self.column)
    }

    fn comparison_column(&self) -> Option<&str> {
        Some(&self.column)
    }
}
