//! The rule abstraction.
//!
//! A rule is a small immutable struct implementing [`Rule`] for the datum type
//! of its granularity:
//!
//! | scope  | datum          |
//! |--------|----------------|
//! | Cell   | [`CellData`]   |
//! | Column | `[String]`     |
//! | Row    | `[String]`     |
//! | Header | `[String]`     |
//! | File   | [`Path`]       |
//!
//! Checking is split in two steps. `prepare` shapes the datum into the exact
//! argument the rule needs and may fail on malformed input. `evaluate` is a pure
//! predicate over that argument. Subjects store rules as `Box<dyn AnyRule<D>>`,
//! which every `Rule<D>` implements through a blanket impl.

use std::collections::HashMap;
use std::fmt;
use std::num::{ParseFloatError, ParseIntError};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::FailureKind;

/// Granularity a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    Cell,
    Column,
    Row,
    Header,
    File,
}

/// Unexpected failure while preparing a datum for a rule.
///
/// Subjects never surface this directly: it is converted into a failure that
/// carries the rule's own kind, and `detail` is only shown in verbose debug mode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{cause}: {detail}")]
pub struct RuleError {
    cause: String,
    detail: String,
}

impl RuleError {
    pub fn new(cause: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            detail: detail.into(),
        }
    }

    /// Short name of what went wrong, safe to print.
    pub fn cause(&self) -> &str {
        &self.cause
    }

    /// Internal detail. May contain the checked value.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<ParseFloatError> for RuleError {
    fn from(err: ParseFloatError) -> Self {
        Self::new("ParseFloatError", err.to_string())
    }
}

impl From<ParseIntError> for RuleError {
    fn from(err: ParseIntError) -> Self {
        Self::new("ParseIntError", err.to_string())
    }
}

impl From<chrono::ParseError> for RuleError {
    fn from(err: chrono::ParseError) -> Self {
        Self::new("DateParseError", err.to_string())
    }
}

/// A cell value together with the sibling values its rules compare against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellData {
    value: String,
    compare: HashMap<String, String>,
}

impl CellData {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            compare: HashMap::new(),
        }
    }

    pub fn with_compare(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.compare.insert(column.into(), value.into());
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Value of a sibling column, if the row provided one.
    pub fn compared(&self, column: &str) -> Option<&str> {
        self.compare.get(column).map(String::as_str)
    }

    pub(crate) fn replace_value(&self, value: String) -> Self {
        Self {
            value,
            compare: self.compare.clone(),
        }
    }
}

impl From<&str> for CellData {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Comparison operator shared by length, numeric, date and column rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Gt,
    Gte,
    Eq,
    Lte,
    Lt,
}

impl Comparison {
    pub fn holds<T: PartialOrd>(self, left: &T, right: &T) -> bool {
        match self {
            Comparison::Gt => left > right,
            Comparison::Gte => left >= right,
            Comparison::Eq => left == right,
            Comparison::Lte => left <= right,
            Comparison::Lt => left < right,
        }
    }

    /// Suffix used in rule labels (`NumericGTE`).
    pub fn suffix(self) -> &'static str {
        match self {
            Comparison::Gt => "GT",
            Comparison::Gte => "GTE",
            Comparison::Eq => "ET",
            Comparison::Lte => "LTE",
            Comparison::Lt => "LT",
        }
    }

    pub fn language(self) -> &'static str {
        match self {
            Comparison::Gt => "greater than",
            Comparison::Gte => "greater than or equal to",
            Comparison::Eq => "equal to",
            Comparison::Lte => "less than or equal to",
            Comparison::Lt => "less than",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.language())
    }
}

/// A single predicate over a datum of type `D`.
pub trait Rule<D: ?Sized>: Send + Sync {
    /// The argument `evaluate` works on.
    type Prepared;

    /// Label used in the error tree, e.g. `MaxChar`.
    fn name(&self) -> String;

    fn kind(&self) -> FailureKind;

    fn scope(&self) -> RuleScope;

    fn prepare(&self, datum: &D) -> Result<Self::Prepared, RuleError>;

    fn evaluate(&self, prepared: Self::Prepared) -> bool;

    /// Description of the condition. Never mentions the checked value.
    fn explain(&self) -> String;

    /// Sibling column this rule reads from the row, if any.
    fn comparison_column(&self) -> Option<&str> {
        None
    }
}

/// Object-safe view of a [`Rule`], implemented for every rule.
pub trait AnyRule<D: ?Sized>: Send + Sync {
    fn name(&self) -> String;
    fn kind(&self) -> FailureKind;
    fn scope(&self) -> RuleScope;
    fn explain(&self) -> String;
    fn comparison_column(&self) -> Option<&str>;

    /// Prepare then evaluate.
    fn check(&self, datum: &D) -> Result<bool, RuleError>;
}

impl<D: ?Sized, R: Rule<D>> AnyRule<D> for R {
    fn name(&self) -> String {
        <R as Rule<D>>::name(self)
    }

    fn kind(&self) -> FailureKind {
        <R as Rule<D>>::kind(self)
    }

    fn scope(&self) -> RuleScope {
        <R as Rule<D>>::scope(self)
    }

    fn explain(&self) -> String {
        <R as Rule<D>>::explain(self)
    }

    fn comparison_column(&self) -> Option<&str> {
        <R as Rule<D>>::comparison_column(self)
    }

    fn check(&self, datum: &D) -> Result<bool, RuleError> {
        let prepared = <R as Rule<D>>::prepare(self, datum)?;
        Ok(<R as Rule<D>>::evaluate(self, prepared))
    }
}

type Predicate<D> = dyn Fn(&D) -> Result<bool, RuleError> + Send + Sync;

/// A rule built from a closure, for checks no built-in rule covers.
pub struct StaticRule<D: ?Sized> {
    name: String,
    kind: FailureKind,
    scope: RuleScope,
    assertion: String,
    predicate: Box<Predicate<D>>,
}

impl<D: ?Sized> StaticRule<D> {
    /// Replace the default `StaticRule` label.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<D: ?Sized> fmt::Debug for StaticRule<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticRule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("scope", &self.scope)
            .field("assertion", &self.assertion)
            .finish_non_exhaustive()
    }
}

impl<D: ?Sized> Rule<D> for StaticRule<D> {
    type Prepared = bool;

    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> FailureKind {
        self.kind
    }

    fn scope(&self) -> RuleScope {
        self.scope
    }

    fn prepare(&self, datum: &D) -> Result<bool, RuleError> {
        (self.predicate)(datum)
    }

    fn evaluate(&self, prepared: bool) -> bool {
        prepared
    }

    fn explain(&self) -> String {
        self.assertion.clone()
    }
}

/// Register an arbitrary predicate as a rule of the given scope.
///
/// `assertion` is the explanation shown when the predicate returns `false`.
/// An `Err` from the predicate is reported like any unexpected rule error.
pub fn make_static_rule<D, F>(
    scope: RuleScope,
    predicate: F,
    assertion: impl Into<String>,
    kind: FailureKind,
) -> StaticRule<D>
where
    D: ?Sized,
    F: Fn(&D) -> Result<bool, RuleError> + Send + Sync + 'static,
{
    StaticRule {
        name: "StaticRule".to_string(),
        kind,
        scope,
        assertion: assertion.into(),
        predicate: Box::new(predicate),
    }
}

/// Cell-scoped static rule over the cell value alone.
pub fn make_static_cell_rule<F>(
    predicate: F,
    assertion: impl Into<String>,
    kind: FailureKind,
) -> StaticRule<CellData>
where
    F: Fn(&str) -> Result<bool, RuleError> + Send + Sync + 'static,
{
    make_static_rule(
        RuleScope::Cell,
        move |cell: &CellData| predicate(cell.value()),
        assertion,
        kind,
    )
}

/// Path-scoped static rule, run during the file pre-flight.
pub fn make_static_file_rule<F>(
    predicate: F,
    assertion: impl Into<String>,
    kind: FailureKind,
) -> StaticRule<Path>
where
    F: Fn(&Path) -> Result<bool, RuleError> + Send + Sync + 'static,
{
    make_static_rule(RuleScope::File, predicate, assertion, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_holds() {
        assert!(Comparison::Gt.holds(&2, &1));
        assert!(!Comparison::Gt.holds(&1, &1));
        assert!(Comparison::Gte.holds(&1, &1));
        assert!(Comparison::Eq.holds(&"a", &"a"));
        assert!(Comparison::Lte.holds(&1.0, &1.5));
        assert!(!Comparison::Lt.holds(&2, &2));
    }

    #[test]
    fn test_static_rule_through_trait_object() {
        let rule: Box<dyn AnyRule<CellData>> = Box::new(
            make_static_cell_rule(
                |v| Ok(v.len() % 2 == 0),
                "must have an even length",
                FailureKind::Length(crate::LengthBound::Exact),
            )
            .named("EvenLength"),
        );

        assert_eq!(rule.name(), "EvenLength");
        assert_eq!(rule.scope(), RuleScope::Cell);
        assert_eq!(rule.check(&CellData::new("ab")), Ok(true));
        assert_eq!(rule.check(&CellData::new("abc")), Ok(false));
    }

    #[test]
    fn test_static_rule_error_is_returned() {
        let rule = make_static_cell_rule(
            |v| Ok(v.parse::<i64>()? > 0),
            "must be positive",
            FailureKind::ValueComparison,
        );
        let err = AnyRule::check(&rule, &CellData::new("x")).unwrap_err();
        assert_eq!(err.cause(), "ParseIntError");
    }

    #[test]
    fn test_cell_data_compare_lookup() {
        let cell = CellData::new("3").with_compare("b", "2");
        assert_eq!(cell.value(), "3");
        assert_eq!(cell.compared("b"), Some("2"));
        assert_eq!(cell.compared("c"), None);
    }
}
