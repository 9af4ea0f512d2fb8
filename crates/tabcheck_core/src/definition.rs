//! Serializable layout definitions.
//!
//! These types mirror what a layout file declares. They carry no behavior of
//! their own: [`LayoutDefinition::into_layout`] turns them into a [`Layout`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::field::{FieldBuilder, FieldType};
use crate::layout::{Layout, LayoutBuilder, LayoutFlags};
use crate::rule::Comparison;
use crate::rules::{
    AsciiChar, CanBeFloat, CanBeInteger, Choice, ColumnComparison, DateComparison, ExactChar,
    LengthComparison, MaxChar, MaxDigit, MinChar, MinDigit, NoLeadingZero, NumericComparison,
    NumericDecimals, OnlyNumbers, Unique,
};

/// A complete layout file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(flatten)]
    pub flags: LayoutFlags,

    /// Regular expressions the file name must match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_name_patterns: Vec<String>,

    pub fields: Vec<FieldDefinition>,
}

/// One column of a layout file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,

    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default)]
    pub strip: bool,

    #[serde(default = "default_true")]
    pub all_errors: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Maximum characters (text) or digits (integer, digit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significant_digits: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<NaiveDate>,

    #[serde(default)]
    pub truncate_time: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    #[serde(default)]
    pub case_insensitive: bool,

    #[serde(default)]
    pub unique: bool,

    /// Values counted as blank when detecting empty rows
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blank_values: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleDefinition>,
}

fn default_true() -> bool {
    true
}

/// An extra rule attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleDefinition {
    ExactChar { length: usize },
    MinChar { length: usize },
    MaxChar { length: usize },
    Ascii,
    MinDigit { count: usize },
    MaxDigit { count: usize },
    OnlyNumbers,
    NoLeadingZero,
    CanBeFloat,
    CanBeInteger,
    NumericDecimals { max_decimals: usize },
    Choice {
        choices: Vec<String>,
        #[serde(default)]
        case_insensitive: bool,
    },
    Length { op: Comparison, value: usize },
    Numeric { op: Comparison, value: f64 },
    Date {
        op: Comparison,
        value: NaiveDate,
        #[serde(default)]
        truncate_time: bool,
    },
    CompareColumn { op: Comparison, column: String },
    Unique,
}

impl RuleDefinition {
    fn apply(self, builder: FieldBuilder) -> FieldBuilder {
        match self {
            RuleDefinition::ExactChar { length } => builder.rule(ExactChar(length)),
            RuleDefinition::MinChar { length } => builder.rule(MinChar(length)),
            RuleDefinition::MaxChar { length } => builder.rule(MaxChar(length)),
            RuleDefinition::Ascii => builder.rule(AsciiChar),
            RuleDefinition::MinDigit { count } => builder.rule(MinDigit(count)),
            RuleDefinition::MaxDigit { count } => builder.rule(MaxDigit(count)),
            RuleDefinition::OnlyNumbers => builder.rule(OnlyNumbers),
            RuleDefinition::NoLeadingZero => builder.rule(NoLeadingZero),
            RuleDefinition::CanBeFloat => builder.rule(CanBeFloat),
            RuleDefinition::CanBeInteger => builder.rule(CanBeInteger),
            RuleDefinition::NumericDecimals { max_decimals } => {
                builder.rule(NumericDecimals::new(max_decimals))
            }
            RuleDefinition::Choice {
                choices,
                case_insensitive,
            } => builder.rule(Choice::new(choices, case_insensitive)),
            RuleDefinition::Length { op, value } => builder.rule(LengthComparison::new(op, value)),
            RuleDefinition::Numeric { op, value } => {
                builder.rule(NumericComparison::new(op, value))
            }
            RuleDefinition::Date {
                op,
                value,
                truncate_time,
            } => builder.rule(DateComparison::new(op, value).truncate_time(truncate_time)),
            RuleDefinition::CompareColumn { op, column } => {
                builder.rule(ColumnComparison::new(op, column))
            }
            RuleDefinition::Unique => builder.column_rule(Unique),
        }
    }
}

impl FieldDefinition {
    fn require<T>(&self, value: Option<T>, parameter: &str) -> Result<T> {
        value.ok_or_else(|| LayoutError::MissingParameter {
            field: self.name.clone(),
            field_type: self.field_type.to_string(),
            parameter: parameter.to_string(),
        })
    }

    /// Field builder carrying the declared type, options and rules.
    pub fn to_builder(&self) -> Result<FieldBuilder> {
        let mut builder = match self.field_type {
            FieldType::Any => FieldBuilder::any(),
            FieldType::Text => FieldBuilder::text(self.require(self.max_length, "max_length")?),
            FieldType::Integer => {
                FieldBuilder::integer(self.require(self.max_length, "max_length")?)
            }
            FieldType::Digit => FieldBuilder::digit(self.require(self.max_length, "max_length")?),
            FieldType::Currency => FieldBuilder::currency(
                self.require(self.significant_digits, "significant_digits")?,
            ),
            FieldType::Date => FieldBuilder::date().truncate_time(self.truncate_time),
            FieldType::Choice => {
                if self.choices.is_empty() {
                    return Err(LayoutError::MissingParameter {
                        field: self.name.clone(),
                        field_type: self.field_type.to_string(),
                        parameter: "choices".to_string(),
                    });
                }
                FieldBuilder::choice(self.choices.iter().cloned())
                    .case_insensitive(self.case_insensitive)
            }
            FieldType::Ignore => FieldBuilder::ignore(),
            FieldType::Empty => FieldBuilder::empty(),
        };

        if let Some(min) = self.min_length {
            builder = builder.min_length(min);
        }
        if let Some(decimals) = self.decimals {
            builder = builder.decimals(decimals);
        }
        if let Some(date) = self.min_date {
            builder = builder.min_date(date);
        }
        if let Some(date) = self.max_date {
            builder = builder.max_date(date);
        }
        if matches!(self.field_type, FieldType::Ignore | FieldType::Empty) || self.nullable {
            builder = builder.nullable(true);
        }
        builder = builder.strip(self.strip).all_errors(self.all_errors);
        if let Some(message) = &self.custom_error {
            builder = builder.custom_error(message.clone());
        }
        if let Some(description) = &self.description {
            builder = builder.describe("Description", Some(description.clone()));
        }
        if self.unique {
            builder = builder.unique();
        }
        for rule in self.rules.iter().cloned() {
            builder = rule.apply(builder);
        }
        Ok(builder)
    }
}

impl LayoutDefinition {
    /// Build the layout, checking per-type parameters and cross-field references.
    pub fn into_layout(self) -> Result<Layout> {
        let mut builder = LayoutBuilder::new().flags(self.flags);
        if let Some(title) = self.title {
            builder = builder.title(title);
        }
        for pattern in self.file_name_patterns {
            builder = builder.file_name_pattern(pattern);
        }
        for field in &self.fields {
            if !field.blank_values.is_empty() {
                builder =
                    builder.blank_values(field.name.clone(), field.blank_values.iter().cloned());
            }
            builder = builder.field(field.name.clone(), field.to_builder()?);
        }
        builder.build()
    }
}

impl TryFrom<LayoutDefinition> for Layout {
    type Error = LayoutError;

    fn try_from(definition: LayoutDefinition) -> Result<Self> {
        definition.into_layout()
    }
}
