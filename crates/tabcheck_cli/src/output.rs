use anyhow::Result;
use colored::*;
use serde_json::json;
use tabcheck_validator::ValidationReport;

pub fn print_validation_report(
    source: &str,
    report: &ValidationReport,
    format: &str,
) -> Result<()> {
    match format {
        "json" => print_json_report(source, report),
        _ => {
            print_text_report(source, report);
            Ok(())
        }
    }
}

fn print_text_report(source: &str, report: &ValidationReport) {
    println!("\n{}", "═".repeat(60));
    println!("{}", "  VALIDATION REPORT".bold());
    println!("{}", "═".repeat(60));
    println!("  Source: {source}");

    if report.passed {
        println!(
            "\n{} {}",
            "✓".green().bold(),
            "Validation PASSED".green().bold()
        );
    } else {
        println!(
            "\n{} {}",
            "✗".red().bold(),
            "Validation FAILED".red().bold()
        );
    }

    if let Some(error) = &report.error {
        println!("\n{}", "Errors:".red().bold());
        for line in error.to_string().lines() {
            println!("{}", line.red());
        }
    }

    println!("\n{}", "Summary:".bold());
    println!("  Rows read:      {}", report.stats.rows_read);
    println!("  Rows failed:    {}", report.stats.rows_failed);
    println!(
        "  Failures:       {}",
        report.error.as_ref().map_or(0, |e| e.failures().len())
    );
    println!("  Duration:       {} ms", report.stats.duration_ms);
    println!("{}", "═".repeat(60));
}

fn print_json_report(source: &str, report: &ValidationReport) -> Result<()> {
    let output = json!({
        "source": source,
        "passed": report.passed,
        "errors": report.error.as_ref().map(|e| e.root()),
        "markdown": report.error.as_ref().map(|e| e.to_string()),
        "stats": report.stats,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
