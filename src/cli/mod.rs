//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - manifest: validate, resolve and tags arguments
//! - acquire: download and unpack arguments
//! - cache: cache command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod acquire;
pub mod cache;
pub mod manifest;

pub use acquire::{DownloadArgs, SelectArgs, UnpackArgs};
pub use cache::{CacheArgs, CacheSubcommand, ClearCacheArgs};
pub use manifest::{ResolveArgs, TagsArgs, ValidateArgs};

/// bundlepath - bundle resolution for versioned content packages
#[derive(Parser, Debug)]
#[command(
    name = "bundlepath",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Resolve asset addresses to bundle locations for versioned content packages",
    long_about = "bundlepath reads a package manifest, decides for every bundle whether it is \
                  cached, shipped in the package payload or must be acquired, and drives \
                  version updates, integrity checks, downloads and unpacking.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  bundlepath validate default.manifest.json  \x1b[90m# Check a manifest\x1b[0m\n   \
                  bundlepath resolve hero/texture            \x1b[90m# Where does an asset load from\x1b[0m\n   \
                  bundlepath tags dlc                        \x1b[90m# Assets tagged dlc\x1b[0m\n   \
                  bundlepath download --tags dlc             \x1b[90m# Fetch missing dlc bundles\x1b[0m\n   \
                  bundlepath update                          \x1b[90m# Activate the newest version\x1b[0m\n   \
                  bundlepath verify                          \x1b[90m# Check cached bundles\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Package configuration file
    #[arg(
        long,
        short = 'c',
        global = true,
        env = "BUNDLEPATH_CONFIG",
        default_value = "bundlepath.yaml"
    )]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate a manifest file
    Validate(ValidateArgs),

    /// Show where asset addresses load from
    Resolve(ResolveArgs),

    /// List assets carrying any of the given tags
    Tags(TagsArgs),

    /// Check local bundles against the manifest
    Verify,

    /// Activate the newest remote version of the package
    Update,

    /// Download bundles that are neither cached nor embedded
    Download(DownloadArgs),

    /// Copy embedded bundles into the cache
    Unpack(UnpackArgs),

    /// Manage the package cache
    #[command(name = "cache")]
    Cache(CacheArgs),

    /// Show version information
    #[command(hide = true)]
    Version,
}
