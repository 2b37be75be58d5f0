//! Update command implementation

use std::path::Path;

use console::Style;

use crate::error::Result;

use super::helpers::{load_config, open_package, update_package};

/// Run update command
///
/// Checks the remote for a newer version and activates its manifest.
pub fn run(config: &Path) -> Result<()> {
    let config = load_config(config)?;
    let package = open_package(&config)?;
    let previous = package.package_version();
    let version = update_package(&package, &config)?;

    if version == previous {
        println!("{} is up to date ({version}).", package.name());
    } else {
        println!(
            "{} {}: {previous} -> {version}",
            Style::new().green().bold().apply_to("Updated"),
            package.name()
        );
    }
    Ok(())
}
