//! bundlepath - manifest-driven bundle resolution
//!
//! Resolves logical asset addresses to the bundles that hold them inside a
//! versioned content package, and decides for every bundle whether it loads
//! from the local cache, from the package payload, or must be acquired
//! first. Version updates, integrity checks, downloads and unpacking run as
//! cooperative operations driven by a tick-based scheduler, so a host
//! application never blocks on them.
//!
//! The entry point is [`Package`], usually built from a
//! [`PackageConfig`](config::PackageConfig).

pub mod acquire;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod hash;
pub mod location;
pub mod logging;
pub mod manifest;
pub mod mode;
pub mod operation;
pub mod package;
pub mod progress;
pub mod resolver;

#[cfg(test)]
mod test_fixtures;

pub use error::{BundleError, ErrorKind, Result};
pub use package::Package;
