//! Behavior that must hold for every field type.

use pretty_assertions::assert_eq;
use tabcheck_core::{
    DebugPolicy, ErrorNode, FailureKind, Field, FieldBuilder, LayoutBuilder, LengthBound,
    RuleError, RuleScope, make_static_cell_rule, make_static_rule,
};

fn all_types() -> Vec<(&'static str, FieldBuilder)> {
    vec![
        ("any", FieldBuilder::any()),
        ("text", FieldBuilder::text(4).min_length(2)),
        ("integer", FieldBuilder::integer(3)),
        ("digit", FieldBuilder::digit(3)),
        ("currency", FieldBuilder::currency(6)),
        ("date", FieldBuilder::date()),
        ("choice", FieldBuilder::choice(["a", "b"])),
    ]
}

fn kinds(failures: &[ErrorNode]) -> Vec<FailureKind> {
    failures
        .iter()
        .filter_map(|node| match node {
            ErrorNode::Failure(f) => Some(f.kind),
            _ => None,
        })
        .collect()
}

#[test]
fn test_empty_value_on_non_nullable_fields() {
    for (name, builder) in all_types() {
        let field = builder.all_errors(false).build();
        assert_eq!(
            kinds(&field.check_value("")),
            vec![FailureKind::NullValue],
            "field type {name}"
        );
    }
}

#[test]
fn test_empty_value_on_nullable_fields() {
    for (name, builder) in all_types() {
        let field = builder
            .nullable(true)
            .rule(make_static_cell_rule(|_| Ok(false), "always fails", FailureKind::Custom))
            .build();
        assert!(field.check_value("").is_empty(), "field type {name}");
    }
}

#[test]
fn test_integer_accepts_canonical_numbers() {
    let field = FieldBuilder::integer(4).build();
    for n in -9999i32..=9999 {
        let value = n.to_string();
        assert!(field.check_value(&value).is_empty(), "{value} should pass");
    }
}

#[test]
fn test_integer_rejects_leading_zeros() {
    let field: Field = FieldBuilder::integer(6).build();
    for value in ["00", "01", "000123", "-01", "-0009", "+07"] {
        let failures = field.check_value(value);
        assert!(
            kinds(&failures).contains(&FailureKind::LeadingZero),
            "{value} should have a leading zero failure"
        );
    }
}

#[test]
fn test_exception_message_in_cell() {
    let layout = LayoutBuilder::new()
        .field("c1", FieldBuilder::integer(1))
        .field("c2", FieldBuilder::integer(1))
        .build()
        .unwrap();
    let row = vec!["1".to_string(), "23".to_string()];
    let err = layout.check_row(&row, 1, DebugPolicy::Sanitized).unwrap();
    assert_eq!(
        err.to_string(),
        " - Row: 2\n   - Cell: 2,2 (c2)\n     - MaxDigit: must have no more than 1 digit characters"
    );
}

#[test]
fn test_static_rules_at_every_granularity() {
    let row_rule = make_static_rule(
        RuleScope::Row,
        |row: &[String]| Ok(row.iter().all(|v| !v.contains(';'))),
        "row must not contain semicolons",
        FailureKind::RowComparison,
    );
    let values = vec!["a;b".to_string()];
    let failures = tabcheck_core::Subject::new()
        .with_rule(row_rule)
        .check(values.as_slice(), DebugPolicy::Sanitized);
    assert_eq!(kinds(&failures), vec![FailureKind::RowComparison]);

    let column_rule = make_static_rule(
        RuleScope::Column,
        |values: &[String]| Ok(values.len() < 3),
        "column must have fewer than three values",
        FailureKind::Length(LengthBound::Max),
    );
    let field = FieldBuilder::any().column_rule(column_rule).build();
    let column: Vec<String> = ["x", "y", "z"].iter().map(|v| v.to_string()).collect();
    assert_eq!(
        kinds(&field.check_column(&column, DebugPolicy::Sanitized)),
        vec![FailureKind::Length(LengthBound::Max)]
    );
}

#[test]
fn test_user_predicate_errors_keep_rule_kind() {
    let field = FieldBuilder::any()
        .rule(
            make_static_cell_rule(
                |v| {
                    let n: i64 = v.parse()?;
                    100i64
                        .checked_div(n)
                        .map(|q| q > 1)
                        .ok_or_else(|| RuleError::new("DivisionByZero", format!("100 / {v}")))
                },
                "must divide 100 into more than one part",
                FailureKind::ValueComparison,
            )
            .named("Divides"),
        )
        .build();

    let failures = field.check_value("0");
    assert_eq!(
        failures,
        vec![ErrorNode::failure(
            "Divides",
            FailureKind::ValueComparison,
            "raised DivisionByZero while checking if value must divide 100 into more than one part"
        )]
    );

    let verbose = field.check_cell(&"0".into(), DebugPolicy::Verbose);
    assert!(verbose[0].to_string().ends_with("[DEBUG]: 100 / 0"));
}
