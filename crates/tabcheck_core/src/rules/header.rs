//! Rules over the header row.
//!
//! All four rules share a [`HeaderMatcher`], which maps each observed header
//! token to at most one expected field index according to the [`HeaderMode`].

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FailureKind;
use crate::rule::{Rule, RuleError, RuleScope};

/// How observed header tokens are reconciled with field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    /// Token must equal the field name
    #[default]
    Exact,
    /// Token and field name must share a prefix, either one starting the other
    #[serde(alias = "startswith")]
    StartsWith,
    /// Either the token or the field name must contain the other
    Contains,
}

/// Maps observed header tokens onto expected field names.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    expected: Vec<String>,
    mode: HeaderMode,
}

impl HeaderMatcher {
    pub fn new(expected: Vec<String>, mode: HeaderMode) -> Self {
        Self { expected, mode }
    }

    pub fn expected(&self) -> &[String] {
        &self.expected
    }

    pub fn mode(&self) -> HeaderMode {
        self.mode
    }

    /// Index of the expected name `token` maps to.
    ///
    /// An exact match always wins. Otherwise the longest expected name that
    /// satisfies the mode in either direction is chosen, the earliest one on
    /// ties. A blank token never matches loosely.
    pub fn index_of(&self, token: &str) -> Option<usize> {
        if let Some(ix) = self.expected.iter().position(|e| e == token) {
            return Some(ix);
        }
        if token.is_empty() {
            return None;
        }
        let matches = |expected: &str| match self.mode {
            HeaderMode::Exact => false,
            HeaderMode::StartsWith => token.starts_with(expected) || expected.starts_with(token),
            HeaderMode::Contains => token.contains(expected) || expected.contains(token),
        };
        self.expected
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_empty() && matches(e.as_str()))
            .fold(None, |best: Option<(usize, usize)>, (ix, e)| match best {
                Some((_, len)) if len >= e.len() => best,
                _ => Some((ix, e.len())),
            })
            .map(|(ix, _)| ix)
    }

    fn resolve(&self, header: &[String]) -> MatchedHeader {
        MatchedHeader {
            tokens: header.to_vec(),
            indices: header.iter().map(|t| self.index_of(t)).collect(),
        }
    }
}

/// A header row paired with the expected index of each token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedHeader {
    pub tokens: Vec<String>,
    pub indices: Vec<Option<usize>>,
}

impl MatchedHeader {
    fn matched(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().flatten().copied()
    }
}

/// Build the four header rules in reporting order.
pub fn header_rules(matcher: Arc<HeaderMatcher>) -> (ColumnOrder, NoExtra, NoDuplicate, NoMissing) {
    (
        ColumnOrder(Arc::clone(&matcher)),
        NoExtra(Arc::clone(&matcher)),
        NoDuplicate(Arc::clone(&matcher)),
        NoMissing(matcher),
    )
}

/// Every expected field must appear in the header.
#[derive(Debug, Clone)]
pub struct NoMissing(pub Arc<HeaderMatcher>);

impl Rule<[String]> for NoMissing {
    type Prepared = MatchedHeader;

    fn name(&self) -> String {
        "NoMissing".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::MissingColumn
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Header
    }

    fn prepare(&self, header: &[String]) -> Result<MatchedHeader, RuleError> {
        Ok(self.0.resolve(header))
    }

    fn evaluate(&self, header: MatchedHeader) -> bool {
        let found: HashSet<usize> = header.matched().collect();
        (0..self.0.expected.len()).all(|ix| found.contains(&ix))
    }

    fn explain(&self) -> String {
        "Header row must not be missing any expected columns".to_string()
    }
}

/// Every header token must map to an expected field.
#[derive(Debug, Clone)]
pub struct NoExtra(pub Arc<HeaderMatcher>);

impl Rule<[String]> for NoExtra {
    type Prepared = MatchedHeader;

    fn name(&self) -> String {
        "NoExtra".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::UnexpectedColumn
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Header
    }

    fn prepare(&self, header: &[String]) -> Result<MatchedHeader, RuleError> {
        Ok(self.0.resolve(header))
    }

    fn evaluate(&self, header: MatchedHeader) -> bool {
        header.indices.iter().all(Option::is_some)
    }

    fn explain(&self) -> String {
        "Header row must not have unexpected columns".to_string()
    }
}

/// No two header tokens may name the same field.
///
/// In exact mode raw tokens are compared. Otherwise matched indices are.
#[derive(Debug, Clone)]
pub struct NoDuplicate(pub Arc<HeaderMatcher>);

impl Rule<[String]> for NoDuplicate {
    type Prepared = MatchedHeader;

    fn name(&self) -> String {
        "NoDuplicate".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::DuplicateColumn
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Header
    }

    fn prepare(&self, header: &[String]) -> Result<MatchedHeader, RuleError> {
        Ok(self.0.resolve(header))
    }

    fn evaluate(&self, header: MatchedHeader) -> bool {
        match self.0.mode {
            HeaderMode::Exact => {
                let mut seen = HashSet::new();
                header.tokens.iter().all(|t| seen.insert(t.as_str()))
            }
            HeaderMode::StartsWith | HeaderMode::Contains => {
                let mut seen = HashSet::new();
                header.matched().all(|ix| seen.insert(ix))
            }
        }
    }

    fn explain(&self) -> String {
        "Header row must not contain duplicate values".to_string()
    }
}

/// Header tokens must follow field order.
///
/// In exact mode the header must equal the field names. Otherwise the matched
/// indices must be strictly increasing.
#[derive(Debug, Clone)]
pub struct ColumnOrder(pub Arc<HeaderMatcher>);

impl Rule<[String]> for ColumnOrder {
    type Prepared = MatchedHeader;

    fn name(&self) -> String {
        "ColumnOrder".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::ColumnOrder
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Header
    }

    fn prepare(&self, header: &[String]) -> Result<MatchedHeader, RuleError> {
        Ok(self.0.resolve(header))
    }

    fn evaluate(&self, header: MatchedHeader) -> bool {
        match self.0.mode {
            HeaderMode::Exact => header.tokens == self.0.expected,
            HeaderMode::StartsWith | HeaderMode::Contains => {
                let indices: Vec<usize> = header.matched().collect();
                indices.windows(2).all(|w| w[0] < w[1])
            }
        }
    }

    fn explain(&self) -> String {
        "Header row must explicitly match order of definition".to_string()
    }
}
