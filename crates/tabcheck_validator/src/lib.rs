//! # tabcheck validator
//!
//! Streams rows from a [`RowSource`] through a [`Layout`](tabcheck_core::Layout)
//! in a single pass:
//!
//! - Pre-flight file rules (existence, file name patterns)
//! - Header check and layout resolution
//! - Row length and cell checks, bounded by a maximum error count
//! - Column rules (uniqueness) over cached values once the stream ends
//!
//! ## Example
//!
//! ```rust
//! use tabcheck_core::{FieldBuilder, LayoutBuilder};
//! use tabcheck_validator::{FileValidator, MemorySource, ValidationOptions};
//!
//! let layout = LayoutBuilder::new()
//!     .field("id", FieldBuilder::integer(4).unique())
//!     .field("name", FieldBuilder::text(20))
//!     .build()
//!     .unwrap();
//!
//! let source = MemorySource::from_rows(
//!     "people.csv",
//!     [["id", "name"], ["1", "Ada"], ["1", "Grace"]],
//! );
//!
//! let validator = FileValidator::new(layout).with_options(ValidationOptions::new());
//! let report = validator.validate(&source).unwrap();
//!
//! if !report.passed {
//!     if let Some(error) = &report.error {
//!         println!("{error}");
//!     }
//! }
//! ```

mod cache;
mod csv_source;
mod engine;
mod error;
mod options;
mod source;

pub use cache::*;
pub use csv_source::*;
pub use engine::*;
pub use error::*;
pub use options::*;
pub use source::*;
