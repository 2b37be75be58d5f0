//! Remote version and manifest sources

use std::fs;
use std::path::PathBuf;

use crate::error::{Result, acquire};

/// Where a patchable package discovers versions and manifests
///
/// Calls block; modes only invoke them from worker threads.
pub trait RemoteSource: Send + Sync {
    /// The newest published version token of `package`
    fn fetch_version(&self, package: &str) -> Result<String>;

    /// Raw manifest bytes of `package` at `version`
    fn fetch_manifest(&self, package: &str, version: &str) -> Result<Vec<u8>>;
}

/// Remote source backed by a directory (a mounted mirror or CDN checkout)
///
/// ```text
/// <root>/<package>.version
/// <root>/<package>_<version>.manifest.json
/// <root>/<bundle file>
/// ```
#[derive(Debug, Clone)]
pub struct DirRemote {
    root: PathBuf,
}

impl DirRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn version_path(&self, package: &str) -> PathBuf {
        self.root.join(format!("{package}.version"))
    }

    pub fn manifest_path(&self, package: &str, version: &str) -> PathBuf {
        self.root.join(format!("{package}_{version}.manifest.json"))
    }
}

impl RemoteSource for DirRemote {
    fn fetch_version(&self, package: &str) -> Result<String> {
        let path = self.version_path(package);
        let content = fs::read_to_string(&path)
            .map_err(|e| acquire::remote_fetch(path.display().to_string(), e.to_string()))?;

        let version = content.trim();
        if version.is_empty() {
            return Err(acquire::remote_fetch(
                path.display().to_string(),
                "version file is empty",
            ));
        }
        Ok(version.to_string())
    }

    fn fetch_manifest(&self, package: &str, version: &str) -> Result<Vec<u8>> {
        let path = self.manifest_path(package, version);
        fs::read(&path).map_err(|e| acquire::remote_fetch(path.display().to_string(), e.to_string()))
    }
}
