//! Rules over a whole data row.

use crate::error::{FailureKind, LengthBound};
use crate::rule::{Rule, RuleError, RuleScope};

/// Row must not have more than `n` cells.
#[derive(Debug, Clone, Copy)]
pub struct RowLengthLTE(pub usize);

impl Rule<[String]> for RowLengthLTE {
    type Prepared = usize;

    fn name(&self) -> String {
        "RowLengthLTE".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::RowLength(LengthBound::Max)
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Row
    }

    fn prepare(&self, row: &[String]) -> Result<usize, RuleError> {
        Ok(row.len())
    }

    fn evaluate(&self, length: usize) -> bool {
        length <= self.0
    }

    fn explain(&self) -> String {
        format!("row length must be equal to {}, not greater", self.0)
    }
}

/// Row must not have fewer than `n` cells.
#[derive(Debug, Clone, Copy)]
pub struct RowLengthGTE(pub usize);

impl Rule<[String]> for RowLengthGTE {
    type Prepared = usize;

    fn name(&self) -> String {
        "RowLengthGTE".to_string()
    }

    fn kind(&self) -> FailureKind {
        FailureKind::RowLength(LengthBound::Min)
    }

    fn scope(&self) -> RuleScope {
        RuleScope::Row
    }

    fn prepare(&self, row: &[String]) -> Result<usize, RuleError> {
        Ok(row.len())
    }

    fn evaluate(&self, length: usize) -> bool {
        length >= self.0
    }

    fn explain(&self) -> String {
        format!("row length must be equal to {}, not less", self.0)
    }
}
