//! Command helper utilities

use std::path::Path;
use std::time::Duration;

use crate::config::PackageConfig;
use crate::error::{Result, fs as fs_err};
use crate::operation::OperationHandle;
use crate::package::Package;
use crate::resolver::BundleLocation;

/// Sleep between scheduler ticks while a command waits
pub const TICK: Duration = Duration::from_millis(5);

/// Load the package configuration named on the command line
pub fn load_config(path: &Path) -> Result<PackageConfig> {
    PackageConfig::load(path)
}

/// Build the configured package and activate its manifest
pub fn open_package(config: &PackageConfig) -> Result<Package> {
    let mut package = config.build()?;
    let init = package.initialize(config.address_case);
    finish(&package, &init)?;
    Ok(package)
}

/// Fetch the newest version and activate its manifest
///
/// Both steps are bounded by the configured update timeout. Returns the
/// version that is active afterwards.
pub fn update_package(package: &Package, config: &PackageConfig) -> Result<String> {
    let timeout = config.update_timeout();
    let check = package.update_version(timeout);
    let version = finish(package, &check)?;
    let update = package.update_manifest(&version, timeout);
    let manifest = finish(package, &update)?;
    Ok(manifest.version().to_string())
}

/// Drive `handle` to completion and return its result
pub fn finish<T>(package: &Package, handle: &OperationHandle<T>) -> Result<T> {
    package.wait(handle, TICK);
    match handle.take() {
        Some(result) => result,
        None => Err(handle.error().unwrap_or_else(|| {
            fs_err::io_error(format!("operation '{}' has no result", handle.name()))
        })),
    }
}

/// Short human-readable form of a location decision
pub fn describe(location: BundleLocation) -> &'static str {
    match location {
        BundleLocation::FromCache => "cache",
        BundleLocation::FromPackagePayload => "payload",
        BundleLocation::MustAcquire => "acquire",
    }
}
