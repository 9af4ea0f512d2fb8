//! Ordered rule sets and the check algorithm shared by every granularity.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorNode, FailureKind};
use crate::rule::{AnyRule, Rule, RuleError};

/// Whether internal error detail may be appended to failure messages.
///
/// Detail can contain checked values, so the default keeps it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugPolicy {
    #[default]
    Sanitized,
    Verbose,
}

impl DebugPolicy {
    fn annotate(self, message: String, err: &RuleError) -> String {
        match self {
            DebugPolicy::Sanitized => message,
            DebugPolicy::Verbose => format!("{message} [DEBUG]: {}", err.detail()),
        }
    }
}

/// Failure recorded when a pre-processing step fails.
pub fn pre_processing_failure(err: &RuleError, debug: DebugPolicy) -> ErrorNode {
    let message = format!("raised {} while preprocessing data", err.cause());
    ErrorNode::failure(
        "PreProcessing",
        FailureKind::PreProcessing,
        debug.annotate(message, err),
    )
}

/// An ordered set of rules over datums of type `D`, plus documentation
/// descriptors and reporting flags.
pub struct Subject<D: ?Sized> {
    rules: Vec<Box<dyn AnyRule<D>>>,
    descriptors: IndexMap<String, Option<String>>,
    all_errors: bool,
    custom_error: Option<String>,
}

impl<D: ?Sized> Subject<D> {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            descriptors: IndexMap::new(),
            all_errors: true,
            custom_error: None,
        }
    }

    pub fn push<R>(&mut self, rule: R)
    where
        R: Rule<D> + 'static,
    {
        self.rules.push(Box::new(rule));
    }

    /// Take the rules out, dropping descriptors and flags.
    pub fn into_rules(self) -> Vec<Box<dyn AnyRule<D>>> {
        self.rules
    }

    pub fn push_boxed(&mut self, rule: Box<dyn AnyRule<D>>) {
        self.rules.push(rule);
    }

    pub fn with_rule<R>(mut self, rule: R) -> Self
    where
        R: Rule<D> + 'static,
    {
        self.push(rule);
        self
    }

    /// Report every violated rule (`true`) or only the first (`false`).
    pub fn set_all_errors(&mut self, all_errors: bool) {
        self.all_errors = all_errors;
    }

    /// Message appended as an extra failure whenever the check fails.
    pub fn set_custom_error(&mut self, message: Option<String>) {
        self.custom_error = message;
    }

    pub fn describe(&mut self, key: impl Into<String>, value: Option<String>) {
        self.descriptors.insert(key.into(), value);
    }

    pub fn descriptors(&self) -> &IndexMap<String, Option<String>> {
        &self.descriptors
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn AnyRule<D>> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Explanation of every rule, in order.
    pub fn explain(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.explain()).collect()
    }

    /// Run every rule against `datum` and return the failures, empty on pass.
    pub fn check(&self, datum: &D, debug: DebugPolicy) -> Vec<ErrorNode> {
        let mut failures = Vec::new();
        for rule in &self.rules {
            let failure = match rule.check(datum) {
                Ok(true) => continue,
                Ok(false) => ErrorNode::failure(rule.name(), rule.kind(), rule.explain()),
                Err(err) => {
                    let message = format!(
                        "raised {} while checking if value {}",
                        err.cause(),
                        rule.explain()
                    );
                    ErrorNode::failure(rule.name(), rule.kind(), debug.annotate(message, &err))
                }
            };
            failures.push(failure);
            if !self.all_errors {
                break;
            }
        }
        if !failures.is_empty() {
            if let Some(message) = &self.custom_error {
                failures.push(ErrorNode::custom(message.clone()));
            }
        }
        failures
    }
}

impl<D: ?Sized> Default for Subject<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ?Sized> fmt::Debug for Subject<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field("descriptors", &self.descriptors)
            .field("all_errors", &self.all_errors)
            .field("custom_error", &self.custom_error)
            .finish()
    }
}
