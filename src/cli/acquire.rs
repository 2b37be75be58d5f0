use clap::{Args, Parser};

use crate::acquire::{AcquisitionOptions, Selector};

/// Which bundles an acquisition command works on
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct SelectArgs {
    /// Every bundle of the manifest (default)
    #[arg(long)]
    pub all: bool,

    /// Bundles carrying any of these tags
    #[arg(long, value_name = "TAG", num_args = 1..)]
    pub tags: Vec<String>,

    /// Bundles needed to load these addresses, dependencies included
    #[arg(long = "address", value_name = "ADDRESS", num_args = 1..)]
    pub addresses: Vec<String>,
}

impl SelectArgs {
    pub fn selector(&self) -> Selector {
        if !self.tags.is_empty() {
            Selector::Tags(self.tags.clone())
        } else if !self.addresses.is_empty() {
            Selector::Addresses(self.addresses.clone())
        } else {
            Selector::All
        }
    }
}

/// Per-command overrides of the configured acquisition limits
#[derive(Args, Debug, Default)]
pub struct LimitArgs {
    /// Maximum transfers in flight
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,

    /// Extra attempts per bundle
    #[arg(long)]
    pub retry: Option<u32>,

    /// Limit for a single attempt, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl LimitArgs {
    /// `configured` with the flags given on the command line applied
    pub fn apply(&self, configured: AcquisitionOptions) -> AcquisitionOptions {
        AcquisitionOptions {
            concurrency: self
                .concurrency
                .and_then(|c| usize::try_from(c).ok())
                .unwrap_or(configured.concurrency),
            retry: self.retry.unwrap_or(configured.retry),
            timeout: self
                .timeout
                .map_or(configured.timeout, std::time::Duration::from_secs),
        }
    }
}

/// Arguments for the download command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Download everything missing:\n    bundlepath download --all\n\n\
                  Download dlc bundles:\n    bundlepath download --tags dlc\n\n\
                  Download what an asset needs:\n    bundlepath download --address level/boss\n\n\
                  Fewer parallel transfers:\n    bundlepath download --all --concurrency 1\n\n\
                  Update to the newest version first:\n    bundlepath download --all --update")]
pub struct DownloadArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Activate the newest remote version before planning
    #[arg(long)]
    pub update: bool,

    #[command(flatten)]
    pub limits: LimitArgs,
}

/// Arguments for the unpack command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Unpack every embedded bundle:\n    bundlepath unpack\n\n\
                  Unpack embedded core bundles:\n    bundlepath unpack --tags core")]
pub struct UnpackArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    #[command(flatten)]
    pub limits: LimitArgs,
}
