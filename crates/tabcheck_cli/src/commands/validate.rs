use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use tabcheck_core::{DebugPolicy, HeaderMode};
use tabcheck_parser::load_layout;
use tabcheck_validator::{CsvSource, FileValidator, MaxErrors, ValidationOptions};
use tracing::info;

use crate::output;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HeaderModeArg {
    Exact,
    StartsWith,
    Contains,
}

impl From<HeaderModeArg> for HeaderMode {
    fn from(arg: HeaderModeArg) -> Self {
        match arg {
            HeaderModeArg::Exact => HeaderMode::Exact,
            HeaderModeArg::StartsWith => HeaderMode::StartsWith,
            HeaderModeArg::Contains => HeaderMode::Contains,
        }
    }
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Path to the layout file (YAML or TOML)
    pub layout: String,

    /// Path to the delimited data file
    pub data: String,

    /// Failing rows collected before reading stops (-1 for no limit)
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    pub max_errors: i64,

    /// Physical rows to drop before the header
    #[arg(long, default_value_t = 0)]
    pub skip_rows: usize,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    pub delimiter: char,

    /// Override the layout's header matching mode
    #[arg(long, value_enum)]
    pub header_mode: Option<HeaderModeArg>,

    /// Treat the first row as data
    #[arg(long)]
    pub no_header: bool,

    /// Consume the header row without checking it
    #[arg(long)]
    pub skip_header: bool,

    /// Accept rows where every value is blank
    #[arg(long)]
    pub empty_row_ok: bool,

    /// Accept blank trailing header columns whose cells stay blank
    #[arg(long)]
    pub empty_cols_ok: bool,

    /// Print cell coordinates as spreadsheet references (C2)
    #[arg(long)]
    pub excel_cells: bool,

    /// Append internal error detail to messages (may expose cell values)
    #[arg(long)]
    pub debug: bool,

    /// Output format: text, json
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

impl ValidateArgs {
    fn options(&self) -> ValidationOptions {
        let mut options = ValidationOptions::new()
            .with_max_errors(MaxErrors::from_signed(self.max_errors))
            .with_skip_rows(self.skip_rows)
            .with_excel_cells(self.excel_cells)
            .with_debug(if self.debug {
                DebugPolicy::Verbose
            } else {
                DebugPolicy::Sanitized
            });
        if let Some(mode) = self.header_mode {
            options = options.with_header_mode(mode.into());
        }
        if self.no_header {
            options = options.with_no_header(true);
        }
        if self.skip_header {
            options = options.with_skip_header(true);
        }
        if self.empty_row_ok {
            options = options.with_empty_row_ok(true);
        }
        if self.empty_cols_ok {
            options = options.with_empty_cols_ok(true);
        }
        options
    }
}

pub fn execute(args: &ValidateArgs) -> Result<()> {
    info!("Validating {} against layout {}", args.data, args.layout);

    if !args.delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character, got '{}'", args.delimiter);
    }

    let layout = load_layout(Path::new(&args.layout))
        .with_context(|| format!("Failed to load layout file: {}", args.layout))?;

    if args.format != "json" {
        output::print_info(&format!(
            "Layout loaded: {} ({} fields)",
            layout.title().unwrap_or(&args.layout),
            layout.len()
        ));
    }

    let source = CsvSource::new(&args.data).with_delimiter(args.delimiter as u8);
    let validator = FileValidator::new(layout).with_options(args.options());
    let report = validator
        .validate(&source)
        .with_context(|| format!("Failed to read data file: {}", args.data))?;

    output::print_validation_report(&args.data, &report, &args.format)?;

    if !report.passed {
        std::process::exit(1);
    }

    Ok(())
}
