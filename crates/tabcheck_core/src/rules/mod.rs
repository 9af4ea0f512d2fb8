//! Built-in rules, grouped by the granularity they apply to.

pub mod cell;
pub mod column;
pub mod file;
pub mod header;
pub mod row;

pub use cell::*;
pub use column::*;
pub use file::*;
pub use header::*;
pub use row::*;
