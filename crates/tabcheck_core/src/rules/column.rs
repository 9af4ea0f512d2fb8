//! Rules over every value of one column, run once after the stream ends.

use std::collections::HashSet;

use crate::error::FailureKind;
use crate::rule::{Rule, RuleError, RuleScope};

/// Non-blank values must not repeat. Blank values are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unique;

impl Rule<[String]> for Unique {
    /// `(non-blank values, distinct non-blank values)`
    type Prepared = (usize, usize);

    fn name(&self) -> String {
        "Unique".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::DuplicateValue
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Column
    }

    fn prepare(&self, values: &[String]) -> Result<(usize, usize), RuleError> {
        let mut seen = HashSet::new();
        let mut total = 0;
        for value in values.iter().filter(|v| !v.is_empty()) {
            total += 1;
            seen.insert(value.as_str());
        }
        Ok((total, seen.len()))
    }

    fn evaluate(&self, (total, distinct): (usize, usize)) -> bool {
        total == distinct
    }

    fn explain(&self) -> String {
        "values must be unique".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::AnyRule;

    fn column(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_unique_ignores_blanks() {
        assert_eq!(AnyRule::check(&Unique, column(&["", "", "x"]).as_slice()), Ok(true));
        assert_eq!(AnyRule::check(&Unique, column(&["x", "x"]).as_slice()), Ok(false));
        assert_eq!(AnyRule::check(&Unique, column(&[]).as_slice()), Ok(true));
    }
}
