use clap::{Parser, Subcommand};

/// Arguments for cache command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show cache statistics:\n    bundlepath cache\n\n\
                  List bundles with their cache state:\n    bundlepath cache list\n\n\
                  Clear the package cache:\n    bundlepath cache clear\n\n\
                  Remove one bundle:\n    bundlepath cache clear --only extra")]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: Option<CacheSubcommand>,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List manifest bundles and whether they are cached
    List,

    /// Clear cached bundles
    Clear(ClearCacheArgs),
}

/// Arguments for cache clear command
#[derive(Parser, Debug)]
pub struct ClearCacheArgs {
    /// Remove only this bundle
    #[arg(long)]
    pub only: Option<String>,
}
