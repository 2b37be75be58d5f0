use clap::Parser;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Validate a manifest file:\n    bundlepath validate payload/default.manifest.json")]
pub struct ValidateArgs {
    /// Manifest JSON file
    pub manifest: PathBuf,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Resolve one address:\n    bundlepath resolve hero/texture\n\n\
                  Resolve several addresses:\n    bundlepath resolve Hero level/boss")]
pub struct ResolveArgs {
    /// Asset addresses to resolve
    #[arg(required = true, num_args = 1..)]
    pub addresses: Vec<String>,
}

/// Arguments for the tags command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Assets tagged dlc or boss:\n    bundlepath tags dlc boss")]
pub struct TagsArgs {
    /// Tags to match; an asset matches when it has any of them
    #[arg(required = true, num_args = 1..)]
    pub tags: Vec<String>,
}
