//! Values retained for column rules.
//!
//! Only fields that declare at least one column rule are cached, so memory
//! grows with rows times those fields, not with the whole file.

use tabcheck_core::{DebugPolicy, ErrorNode, Layout};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedColumn {
    index: usize,
    name: String,
    values: Vec<String>,
}

/// Per-field value buffers, filled row by row and checked once at the end.
#[derive(Debug, Clone, Default)]
pub struct ColumnCache {
    columns: Vec<CachedColumn>,
}

impl ColumnCache {
    pub fn for_layout(layout: &Layout) -> Self {
        let columns = layout
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, (_, field))| field.has_column_rules())
            .map(|(index, (name, _))| CachedColumn {
                index,
                name: name.clone(),
                values: Vec::new(),
            })
            .collect();
        Self { columns }
    }

    /// Append this row's values. Missing cells are cached as `""`.
    pub fn record(&mut self, row: &[String]) {
        for column in &mut self.columns {
            column
                .values
                .push(row.get(column.index).cloned().unwrap_or_default());
        }
    }

    /// Number of cached fields.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Cached values of one field, in row order.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.values.as_slice())
    }

    /// Run each cached field's column rules over its values.
    pub fn check(&self, layout: &Layout, debug: DebugPolicy) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        for column in &self.columns {
            let Some(field) = layout.field(&column.name) else {
                continue;
            };
            debug!(
                column = %column.name,
                values = column.values.len(),
                "Checking column rules"
            );
            let failures = field.check_column(&column.values, debug);
            if !failures.is_empty() {
                errors.push(ErrorNode::column(column.index, &column.name, failures));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabcheck_core::{FailureKind, FieldBuilder, LayoutBuilder};

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn layout() -> Layout {
        LayoutBuilder::new()
            .field("name", FieldBuilder::text(10))
            .field("id", FieldBuilder::integer(3).unique())
            .build()
            .unwrap()
    }

    #[test]
    fn test_only_fields_with_column_rules_are_cached() {
        let layout = layout();
        let mut cache = ColumnCache::for_layout(&layout);
        cache.record(&row(&["a", "1"]));
        cache.record(&row(&["b"]));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.values("id"), Some(&["1".to_string(), String::new()][..]));
        assert_eq!(cache.values("name"), None);
    }

    #[test]
    fn test_duplicate_values_produce_column_node() {
        let layout = layout();
        let mut cache = ColumnCache::for_layout(&layout);
        for values in [["a", "7"], ["b", "8"], ["c", "7"]] {
            cache.record(&row(&values));
        }

        let errors = cache.check(&layout, DebugPolicy::Sanitized);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].has_failure(FailureKind::DuplicateValue));
        assert_eq!(
            errors[0].to_string(),
            " - Column: 2 (id)\n   - Unique: values must be unique"
        );
    }

    #[test]
    fn test_blank_values_do_not_count_as_duplicates() {
        let layout = layout();
        let mut cache = ColumnCache::for_layout(&layout);
        for values in [["a", ""], ["b", ""], ["c", "1"]] {
            cache.record(&row(&values));
        }
        assert!(cache.check(&layout, DebugPolicy::Sanitized).is_empty());
    }
}
