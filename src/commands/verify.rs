//! Verify command implementation

use std::path::Path;

use console::Style;

use crate::error::{Result, acquire};
use crate::mode::IntegrityReport;

use super::helpers::{finish, load_config, open_package};

/// Run verify command
///
/// Fails when any bundle is missing or corrupt.
pub fn run(config: &Path) -> Result<()> {
    let config = load_config(config)?;
    let package = open_package(&config)?;
    let scan = package.verify_integrity();
    let report = finish(&package, &scan)?;

    print_report(&report);

    if report.is_clean() {
        return Ok(());
    }
    let mut names: Vec<&str> = report.missing.iter().map(String::as_str).collect();
    names.extend(report.corrupt.iter().map(|(name, _)| name.as_str()));
    Err(acquire::integrity(
        names.join(", "),
        format!(
            "{} missing, {} corrupt",
            report.missing.len(),
            report.corrupt.len()
        ),
    ))
}

fn print_report(report: &IntegrityReport) {
    println!("Integrity report:");
    println!("  Intact: {}", report.intact);
    if report.skipped > 0 {
        println!("  Skipped: {}", report.skipped);
    }

    let red = Style::new().red();
    for name in &report.missing {
        println!("  {} {name}", red.apply_to("missing"));
    }
    for (name, reason) in &report.corrupt {
        println!("  {} {name}: {reason}", red.apply_to("corrupt"));
    }
}
