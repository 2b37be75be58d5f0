//! Manifest commands: validate, resolve and tags

use std::fs;
use std::path::Path;

use console::Style;

use crate::cli::{ResolveArgs, TagsArgs, ValidateArgs};
use crate::error::{Result, fs as fs_err};
use crate::manifest::{AddressCase, Manifest};
use crate::package::Package;

use super::helpers::{describe, load_config, open_package};

/// Run validate command
///
/// Needs no configuration: only the manifest file is read.
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let bytes = fs::read(&args.manifest)
        .map_err(|e| fs_err::read_failed(args.manifest.display().to_string(), e.to_string()))?;
    let manifest = Manifest::load(&bytes, AddressCase::Preserve)?;

    println!(
        "{} {} {}",
        Style::new().green().bold().apply_to("Valid manifest:"),
        manifest.package_name(),
        manifest.version()
    );
    println!("  Bundles: {}", manifest.bundles().len());
    println!("  Assets: {}", manifest.assets().len());
    let total: u64 = manifest.bundles().iter().map(|b| b.size).sum();
    println!("  Total size: {total} B");

    Ok(())
}

/// Run resolve command
pub fn run_resolve(config: &Path, args: &ResolveArgs) -> Result<()> {
    let config = load_config(config)?;
    let package = open_package(&config)?;

    for address in &args.addresses {
        print_resolution(&package, address)?;
    }
    Ok(())
}

fn print_resolution(package: &Package, address: &str) -> Result<()> {
    let owner = package.resolve_bundle(address)?;
    let deps = package.resolve_dependencies(address)?;
    let bold = Style::new().bold();

    println!("{}", Style::new().bold().yellow().apply_to(address));
    println!(
        "  {} {} ({})",
        bold.apply_to("Bundle:"),
        owner.bundle.name,
        describe(owner.location)
    );
    if deps.is_empty() {
        println!("  {} none", bold.apply_to("Dependencies:"));
    } else {
        println!("  {}", bold.apply_to("Dependencies:"));
        for dep in &deps {
            println!("    {} ({})", dep.bundle.name, describe(dep.location));
        }
    }
    Ok(())
}

/// Run tags command
pub fn run_tags(config: &Path, args: &TagsArgs) -> Result<()> {
    let config = load_config(config)?;
    let package = open_package(&config)?;
    let assets = package.query_by_tags(&args.tags)?;

    if assets.is_empty() {
        println!("No assets match.");
        return Ok(());
    }

    println!("Matching assets ({}):", assets.len());
    for asset in &assets {
        println!(
            "  {} {} [{}]",
            asset.path,
            Style::new().dim().apply_to(format!("({})", asset.bundle)),
            asset.tags.join(", ")
        );
    }
    Ok(())
}
