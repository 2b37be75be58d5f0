//! Cache command implementation

use std::path::Path;

use console::Style;

use crate::cache::{CacheStore, DirCacheStore};
use crate::cli::{CacheArgs, CacheSubcommand};
use crate::config::PackageConfig;
use crate::error::{Result, cache as cache_err};

use super::helpers::{load_config, open_package};

pub fn run(config: &Path, args: &CacheArgs) -> Result<()> {
    let config = load_config(config)?;
    let store = config.cache_store()?;

    match &args.command {
        None => show_cache_stats(&store),
        Some(CacheSubcommand::List) => list_bundles(&config, &store),
        Some(CacheSubcommand::Clear(clear)) => match &clear.only {
            Some(name) => clean_specific_bundle(&config, &store, name),
            None => clean_all_cache(&store),
        },
    }
}

fn show_cache_stats(store: &DirCacheStore) -> Result<()> {
    let stats = store.stats()?;

    println!("Cache Statistics:");
    println!("  Location: {}", store.root().display());
    println!("  Bundles: {}", stats.entries);
    println!("  Size: {}", stats.formatted_size());

    if stats.entries == 0 {
        println!("\nCache is empty.");
    } else {
        println!("\nRun 'bundlepath cache list' to see which bundles are cached.");
        println!("Run 'bundlepath cache clear' to remove everything from cache.");
    }
    Ok(())
}

fn list_bundles(config: &PackageConfig, store: &DirCacheStore) -> Result<()> {
    let package = open_package(config)?;
    let manifest = package.active_manifest()?;

    println!(
        "Bundles of {} {} ({}):",
        manifest.package_name(),
        manifest.version(),
        manifest.bundles().len()
    );
    for bundle in manifest.bundles() {
        let state = if store.is_cached(bundle) {
            Style::new().green().apply_to("cached")
        } else {
            Style::new().dim().apply_to("absent")
        };
        println!("  {} {} ({} B)", state, bundle.name, bundle.size);
    }
    Ok(())
}

fn clean_all_cache(store: &DirCacheStore) -> Result<()> {
    store.clear()?;
    println!("Cache cleared successfully.");
    Ok(())
}

fn clean_specific_bundle(config: &PackageConfig, store: &DirCacheStore, name: &str) -> Result<()> {
    let package = open_package(config)?;
    let manifest = package.active_manifest()?;
    let bundle = manifest.bundle(name).ok_or_else(|| {
        cache_err::operation_failed(format!("Bundle '{name}' is not in the manifest"))
    })?;

    if store.remove(bundle)? {
        println!("Removed cached bundle: {name}");
    } else {
        println!("Bundle '{name}' was not cached.");
    }
    Ok(())
}
