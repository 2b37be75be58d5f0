//! Cache path utilities and constants

use std::path::{Path, PathBuf};

use crate::error::{BundleError, Result};
use crate::hash;

/// Default cache directory name under user's cache directory
const CACHE_DIR: &str = "bundlepath";

/// Environment variable overriding the cache root
pub const CACHE_DIR_ENV: &str = "BUNDLEPATH_CACHE_DIR";

/// Get the default cache directory path
///
/// Uses the platform's standard cache location (e.g. XDG on Linux, Library/Caches on macOS)
/// with a `bundlepath` subdirectory. Can be overridden with the `BUNDLEPATH_CACHE_DIR`
/// environment variable.
pub fn cache_dir() -> Result<PathBuf> {
    if let Ok(cache_dir) = std::env::var(CACHE_DIR_ENV) {
        return Ok(PathBuf::from(cache_dir));
    }

    let base = dirs::cache_dir().ok_or_else(|| BundleError::CacheOperationFailed {
        message: "Could not determine cache directory".to_string(),
    })?;

    Ok(base.join(CACHE_DIR))
}

/// Cache root from configuration, falling back to [`cache_dir`]
pub fn resolve_cache_root(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(path) => Ok(path.to_path_buf()),
        None => cache_dir(),
    }
}

/// Per-package directory below the cache root
pub fn package_cache_dir(cache_root: &Path, package: &str) -> PathBuf {
    cache_root.join(package)
}

/// Location of a bundle inside a package cache: `<hash hex>/<file name>`
pub fn entry_path(package_root: &Path, hash: &str, file_name: &str) -> PathBuf {
    package_root
        .join(hash::hex_digest(hash).to_ascii_lowercase())
        .join(file_name)
}
