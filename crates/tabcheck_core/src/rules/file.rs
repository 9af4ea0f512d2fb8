//! Pre-flight rules over the path of a row source.

use std::path::Path;

use regex::Regex;

use crate::error::FailureKind;
use crate::rule::{Rule, RuleError, RuleScope};

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileExists;

impl Rule<Path> for FileExists {
    type Prepared = bool;

    fn name(&self) -> String {
        "FileExists".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::FileNotFound
    }

    fn scope(&self) -> RuleScope {
        RuleScope::File
    }

    fn prepare(&self, path: &Path) -> Result<bool, RuleError> {
        Ok(path.is_file())
    }

    fn evaluate(&self, exists: bool) -> bool {
        exists
    }

    fn explain(&self) -> String {
        "file must exist".to_string()
    }
}

/// The file name must match at least one of the patterns.
///
/// Patterns are expected to be [`anchored`].
#[derive(Debug, Clone)]
pub struct FileNameMatchesPattern {
    patterns: Vec<Regex>,
}

impl FileNameMatchesPattern {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }
}

impl Rule<Path> for FileNameMatchesPattern {
    /// Number of patterns matching the file name
    type Prepared = usize;

    fn name(&self) -> String {
        "FileNameMatchesPattern".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::FilePattern
    }

    fn scope(&self) -> RuleScope {
        RuleScope::File
    }

    fn prepare(&self, path: &Path) -> Result<usize, RuleError> {
        Ok(count_full_matches(&self.patterns, &file_name(path)))
    }

    fn evaluate(&self, matches: usize) -> bool {
        matches > 0
    }

    fn explain(&self) -> String {
        "file name must match a pattern provided in the layout".to_string()
    }
}

/// The file name must not match more than one of the patterns.
#[derive(Debug, Clone)]
pub struct FileNameMatchesOnePattern {
    patterns: Vec<Regex>,
}

impl FileNameMatchesOnePattern {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }
}

impl Rule<Path> for FileNameMatchesOnePattern {
    type Prepared = usize;

    fn name(&self) -> String {
        "FileNameMatchesOnePattern".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::FilePattern
    }

    fn scope(&self) -> RuleScope {
        RuleScope::File
    }

    fn prepare(&self, path: &Path) -> Result<usize, RuleError> {
        Ok(count_full_matches(&self.patterns, &file_name(path)))
    }

    fn evaluate(&self, matches: usize) -> bool {
        matches <= 1
    }

    fn explain(&self) -> String {
        "file name cannot match multiple patterns provided in the layout".to_string()
    }
}

/// Compile `pattern` so that it only matches a whole file name.
pub fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

fn count_full_matches(patterns: &[Regex], name: &str) -> usize {
    patterns.iter().filter(|re| re.is_match(name)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::AnyRule;

    fn patterns(sources: &[&str]) -> Vec<Regex> {
        sources.iter().map(|s| anchored(s).unwrap()).collect()
    }

    #[test]
    fn test_pattern_must_match_whole_name() {
        let rule = FileNameMatchesPattern::new(patterns(&[r"sales_\d{8}\.csv"]));
        assert_eq!(AnyRule::check(&rule, Path::new("/tmp/sales_20200101.csv")), Ok(true));
        assert_eq!(AnyRule::check(&rule, Path::new("/tmp/old_sales_20200101.csv")), Ok(false));
    }

    #[test]
    fn test_only_one_pattern_may_match() {
        let rule = FileNameMatchesOnePattern::new(patterns(&[r".*\.csv", r"a|a\.csv"]));
        assert_eq!(AnyRule::check(&rule, Path::new("b.csv")), Ok(true));
        assert_eq!(AnyRule::check(&rule, Path::new("a.csv")), Ok(false));
    }

    #[test]
    fn test_missing_file() {
        assert_eq!(
            AnyRule::check(&FileExists, Path::new("/definitely/not/here.csv")),
            Ok(false)
        );
    }
}
