//! Package configuration (bundlepath.yaml) data structures

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::acquire::{AcquisitionOptions, DirTransport};
use crate::cache::{DirCacheStore, resolve_cache_root};
use crate::error::{Result, config as config_err, fs as fs_err};
use crate::location::DefaultAddressResolver;
use crate::manifest::{AddressCase, ManifestDocument};
use crate::mode::{DirRemote, HostMode, ModeKind, OfflineMode, embedded_manifest_path};
use crate::package::Package;

/// Default configuration file name
pub const CONFIG_FILE: &str = "bundlepath.yaml";

/// Package configuration from bundlepath.yaml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Package name
    pub package: String,

    /// Play mode, fixed for the lifetime of the package
    #[serde(default)]
    pub mode: ModeKind,

    /// Address normalization applied to the manifest's address index
    #[serde(default)]
    pub address_case: AddressCase,

    /// Prefix the address resolver puts in front of locations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_root: Option<String>,

    /// Directory with the embedded manifest and bundle files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_dir: Option<PathBuf>,

    /// Remote mirror for version, manifest and bundle files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_dir: Option<PathBuf>,

    /// Cache root, overriding `BUNDLEPATH_CACHE_DIR` and the user cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Limit for version and manifest updates
    #[serde(default = "default_update_timeout")]
    pub update_timeout_secs: u64,

    #[serde(default)]
    pub acquisition: AcquisitionConfig,
}

/// Limits for download and unpack jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub concurrency: usize,
    pub retry: u32,
    pub timeout_secs: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        let defaults = AcquisitionOptions::default();
        Self {
            concurrency: defaults.concurrency,
            retry: defaults.retry,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

fn default_update_timeout() -> u64 {
    30
}

impl PackageConfig {
    /// Create a configuration with defaults for everything but the name
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            mode: ModeKind::default(),
            address_case: AddressCase::default(),
            resource_root: None,
            payload_dir: None,
            remote_dir: None,
            cache_dir: None,
            update_timeout_secs: default_update_timeout(),
            acquisition: AcquisitionConfig::default(),
        }
    }

    /// Parse package configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize package configuration to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load configuration from `path`
    ///
    /// Relative directories in the file are taken relative to its location.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(config_err::not_found(path.display().to_string()));
        }
        let yaml = fs::read_to_string(path)
            .map_err(|e| fs_err::read_failed(path.display().to_string(), e.to_string()))?;
        let mut config: Self = serde_yaml::from_str(&yaml)
            .map_err(|e| config_err::parse_failed(path.display().to_string(), e.to_string()))?;

        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            package = %config.package,
            mode = %config.mode,
            "Loaded package configuration"
        );
        Ok(config)
    }

    fn rebase(&mut self, base: &Path) {
        for dir in [
            &mut self.payload_dir,
            &mut self.remote_dir,
            &mut self.cache_dir,
        ]
        .into_iter()
        .flatten()
        {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Validate package configuration
    pub fn validate(&self) -> Result<()> {
        if self.package.trim().is_empty() {
            return Err(config_err::invalid("Package name cannot be empty"));
        }
        if self.acquisition.concurrency == 0 {
            return Err(config_err::invalid(
                "acquisition.concurrency must be at least 1",
            ));
        }
        match self.mode {
            ModeKind::Offline if self.payload_dir.is_none() => Err(config_err::invalid(
                "offline mode requires payload_dir",
            )),
            ModeKind::Host if self.remote_dir.is_none() => {
                Err(config_err::invalid("host mode requires remote_dir"))
            }
            _ => Ok(()),
        }
    }

    pub fn acquisition_options(&self) -> AcquisitionOptions {
        AcquisitionOptions {
            concurrency: self.acquisition.concurrency,
            retry: self.acquisition.retry,
            timeout: Duration::from_secs(self.acquisition.timeout_secs),
        }
    }

    pub fn update_timeout(&self) -> Duration {
        Duration::from_secs(self.update_timeout_secs)
    }

    /// The package's on-disk cache store
    pub fn cache_store(&self) -> Result<DirCacheStore> {
        let root = resolve_cache_root(self.cache_dir.as_deref())?;
        Ok(DirCacheStore::for_package(&root, &self.package))
    }

    /// Build the package described by this configuration
    ///
    /// The package is not initialized yet.
    pub fn build(&self) -> Result<Package> {
        self.validate()?;

        let cache = self.cache_store()?;
        let addresses = Arc::new(DefaultAddressResolver::new(self.resource_root.as_deref()));

        let package = match self.mode {
            ModeKind::Offline => {
                let payload = self.required_dir(self.payload_dir.as_ref(), "payload_dir")?;
                Package::new(
                    &self.package,
                    OfflineMode::from_dir(payload),
                    Arc::new(cache),
                )
            }
            ModeKind::Host => {
                let mode = self.host_mode(&cache)?;
                Package::new(&self.package, mode, Arc::new(cache))
            }
        };
        Ok(package.with_address_resolver(addresses))
    }

    fn host_mode(&self, cache: &DirCacheStore) -> Result<HostMode> {
        let remote = self.required_dir(self.remote_dir.as_ref(), "remote_dir")?;
        let mut mode = HostMode::new(
            Arc::new(DirRemote::new(remote)),
            Arc::new(DirTransport::new(remote, cache.root())),
        );

        if let Some(payload) = &self.payload_dir {
            let embedded = embedded_manifest_path(payload, &self.package);
            if embedded.is_file() {
                let bytes = fs::read(&embedded).map_err(|e| {
                    fs_err::read_failed(embedded.display().to_string(), e.to_string())
                })?;
                mode = mode.with_embedded(ManifestDocument::from_json(&bytes)?);
            }
            mode = mode.with_unpack(Arc::new(DirTransport::new(payload, cache.root())));
        }
        Ok(mode)
    }

    fn required_dir<'a>(&self, dir: Option<&'a PathBuf>, field: &str) -> Result<&'a PathBuf> {
        dir.ok_or_else(|| config_err::invalid(format!("{} mode requires {field}", self.mode)))
    }
}
