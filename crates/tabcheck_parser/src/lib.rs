//! Parser for tabcheck layout files (YAML/TOML formats).
//!
//! Layout files declare the columns of a tabular file, their types and extra
//! rules. Parsing yields a [`LayoutDefinition`]; [`load_layout`] goes one step
//! further and builds the checked [`Layout`].
//!
//! # Example
//!
//! ```rust
//! use tabcheck_parser::parse_yaml;
//!
//! let yaml = r#"
//! title: customers
//! header_mode: starts_with
//! fields:
//!   - name: id
//!     type: integer
//!     max_length: 6
//!     unique: true
//!   - name: email
//!     type: text
//!     max_length: 120
//!     nullable: true
//! "#;
//!
//! let definition = parse_yaml(yaml).expect("Failed to parse layout");
//! assert_eq!(definition.fields.len(), 2);
//! ```

use std::path::Path;

use tabcheck_core::{Layout, LayoutDefinition, LayoutError};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while reading a layout file.
#[derive(Debug, Error)]
pub enum ParserError {
    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,

    /// The definition parsed but does not describe a usable layout
    #[error("Invalid layout: {0}")]
    Layout(#[from] LayoutError),
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Supported layout file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
}

/// Parse a layout definition from a YAML string.
///
/// # Arguments
///
/// * `content` - The YAML string to parse
///
/// # Example
///
/// ```rust
/// use tabcheck_parser::parse_yaml;
///
/// let yaml = r#"
/// fields:
///   - name: code
///     type: digit
///     max_length: 4
/// "#;
///
/// let definition = parse_yaml(yaml).unwrap();
/// assert_eq!(definition.fields[0].name, "code");
/// ```
pub fn parse_yaml(content: &str) -> Result<LayoutDefinition> {
    let definition = serde_yaml_ng::from_str(content)?;
    Ok(definition)
}

/// Parse a layout definition from a TOML string.
///
/// # Arguments
///
/// * `content` - The TOML string to parse
///
/// # Example
///
/// ```rust
/// use tabcheck_parser::parse_toml;
///
/// let toml = r#"
/// empty_row_ok = true
///
/// [[fields]]
/// name = "code"
/// type = "digit"
/// max_length = 4
/// "#;
///
/// let definition = parse_toml(toml).unwrap();
/// assert!(definition.flags.empty_row_ok);
/// ```
pub fn parse_toml(content: &str) -> Result<LayoutDefinition> {
    toml::from_str(content).map_err(|e| ParserError::TomlError(e.to_string()))
}

/// Detect the layout format from a file path.
///
/// # Errors
///
/// Returns `ParserError::InvalidExtension` if the file has no extension.
/// Returns `ParserError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<LayoutFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ParserError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(LayoutFormat::Yaml),
        "toml" => Ok(LayoutFormat::Toml),
        other => Err(ParserError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a layout definition from a file, picking the format by extension.
///
/// ```no_run
/// use tabcheck_parser::parse_file;
/// use std::path::Path;
///
/// let definition = parse_file(Path::new("layouts/customers.yml")).unwrap();
/// println!("{} fields", definition.fields.len());
/// ```
pub fn parse_file(path: &Path) -> Result<LayoutDefinition> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, "Parsing layout file");

    match format {
        LayoutFormat::Yaml => parse_yaml(&content),
        LayoutFormat::Toml => parse_toml(&content),
    }
}

/// Parse a layout file and build the [`Layout`] it declares.
pub fn load_layout(path: &Path) -> Result<Layout> {
    let layout = parse_file(path)?.into_layout()?;
    debug!(fields = layout.len(), "Layout loaded");
    Ok(layout)
}
