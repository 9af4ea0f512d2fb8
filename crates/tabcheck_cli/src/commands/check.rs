use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tabcheck_parser::load_layout;
use tracing::info;

use crate::output;

pub fn execute(layout_path: &str, format: &str) -> Result<()> {
    info!("Checking layout: {}", layout_path);

    let layout = load_layout(Path::new(layout_path))
        .with_context(|| format!("Failed to load layout file: {}", layout_path))?;

    if format == "json" {
        let fields: Vec<_> = layout
            .digest()
            .into_iter()
            .map(|(name, lines)| json!({ "name": name, "digest": lines }))
            .collect();
        let flags = layout.flags();
        let output = json!({
            "title": layout.title(),
            "flags": flags,
            "file_name_patterns": layout
                .file_patterns()
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>(),
            "fields": fields,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    output::print_success("Layout is valid");

    let flags = layout.flags();
    println!("\nLayout Summary:");
    println!("  Title:        {}", layout.title().unwrap_or("N/A"));
    println!("  Fields:       {}", layout.len());
    println!("  Header mode:  {:?}", flags.header_mode);
    if flags.no_header {
        println!("  Header:       none");
    } else if flags.skip_header {
        println!("  Header:       skipped");
    }
    if flags.empty_row_ok {
        println!("  Empty rows:   accepted");
    }
    if flags.empty_cols_ok {
        println!("  Empty cols:   accepted");
    }
    if !layout.file_patterns().is_empty() {
        let patterns: Vec<&str> = layout.file_patterns().iter().map(|p| p.as_str()).collect();
        println!("  File names:   {}", patterns.join(", "));
    }

    println!("\nFields:");
    for (name, lines) in layout.digest() {
        println!("  {name}");
        for line in lines {
            println!("    - {line}");
        }
    }

    Ok(())
}
