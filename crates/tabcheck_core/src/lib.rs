//! # Tabcheck Core
//!
//! Rules, fields, layouts and the error tree used to check tabular text data.
//!
//! ## Key Concepts
//!
//! - **Rule**: an immutable predicate with a sanitized explanation, scoped to a
//!   cell, column, row, header or file
//! - **Subject**: an ordered rule set and the algorithm that runs it
//! - **Field**: the rules and documentation of one column
//! - **Layout**: ordered fields plus structural options (header mode, empty rows,
//!   empty trailing columns)
//! - **ErrorNode**: File → Row → Cell/Column → rule failure, rendered as an
//!   indented markdown list
//!
//! ## Example
//!
//! ```rust
//! use tabcheck_core::{DebugPolicy, FailureKind, FieldBuilder, LayoutBuilder};
//!
//! let layout = LayoutBuilder::new()
//!     .field("col1", FieldBuilder::text(1))
//!     .field("col2", FieldBuilder::integer(1))
//!     .field("col3", FieldBuilder::date())
//!     .build()
//!     .unwrap();
//!
//! let row: Vec<String> = ["A", "1", "2020-13-01"].iter().map(|v| v.to_string()).collect();
//! let err = layout.check_row(&row, 1, DebugPolicy::Sanitized).unwrap();
//! assert!(err.has_failure(FailureKind::Conversion));
//! ```

pub mod definition;
pub mod error;
pub mod field;
pub mod layout;
pub mod rule;
pub mod rules;
pub mod subject;

pub use definition::*;
pub use error::*;
pub use field::*;
pub use layout::*;
pub use rule::*;
pub use rules::*;
pub use subject::*;
