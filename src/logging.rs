//! Logging setup for the command line tool
//!
//! Library code only emits `tracing` events; the binary decides where they
//! go. Events are written to stderr so command output on stdout stays
//! parseable. `RUST_LOG` takes precedence over the verbosity flag.

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "bundlepath=debug" } else { "warn" }
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    // Fails only when a subscriber is already installed
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
