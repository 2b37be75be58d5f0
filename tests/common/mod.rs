//! Common test utilities for bundlepath integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

use assert_cmd::Command;
use bundlepath::hash;
use bundlepath::manifest::{AssetInfo, ManifestDocument, PackageBundle};
use bundlepath::mode::embedded_manifest_path;
use tempfile::TempDir;

pub const PACKAGE: &str = "game";

/// Deterministic bundle content
pub fn content(name: &str) -> Vec<u8> {
    format!("content of {name}\n").repeat(16).into_bytes()
}

pub fn bundle(name: &str, deps: &[&str], tags: &[&str]) -> PackageBundle {
    let bytes = content(name);
    PackageBundle {
        name: name.to_string(),
        hash: hash::hash_bytes(&bytes),
        size: bytes.len() as u64,
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
        dependencies: deps.iter().map(|d| (*d).to_string()).collect(),
    }
}

fn asset(path: &str, bundle: &str, tags: &[&str]) -> AssetInfo {
    AssetInfo {
        path: path.to_string(),
        bundle: bundle.to_string(),
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
    }
}

/// Package with a shared UI bundle, two levels and an optional dlc
///
/// ```text
/// ui/common <- level1 <- dlc
///           <- level2
/// ```
pub fn document(version: &str) -> ManifestDocument {
    let mut doc = ManifestDocument {
        package_name: PACKAGE.to_string(),
        package_version: version.to_string(),
        bundles: vec![
            bundle("ui/common", &[], &["core"]),
            bundle("level1", &["ui/common"], &["levels"]),
            bundle("level2", &["ui/common"], &["levels"]),
            bundle("dlc", &["level1"], &["dlc"]),
        ],
        assets: vec![
            asset("ui/button", "ui/common", &["ui"]),
            asset("levels/one", "level1", &["level"]),
            asset("levels/two", "level2", &["level"]),
            asset("dlc/castle", "dlc", &["dlc", "level"]),
        ],
        ..Default::default()
    };
    doc.addresses
        .insert("Castle".to_string(), "dlc/castle".to_string());
    doc
}

/// A temporary package directory for integration tests
pub struct TestPackage {
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestPackage {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    pub fn payload_dir(&self) -> PathBuf {
        self.path.join("payload")
    }

    pub fn remote_dir(&self) -> PathBuf {
        self.path.join("remote")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.path.join("cache")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path.join("bundlepath.yaml")
    }

    /// Write a file relative to the package directory
    pub fn write_file(&self, path: &str, content: &[u8]) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    fn write_bundles(&self, dir: &str, doc: &ManifestDocument, names: &[&str]) {
        for b in doc.bundles.iter().filter(|b| names.contains(&b.name.as_str())) {
            self.write_file(&format!("{dir}/{}", b.file_name()), &content(&b.name));
        }
    }

    /// Embedded manifest plus the named bundle files
    pub fn write_payload(&self, doc: &ManifestDocument, names: &[&str]) {
        self.write_bundles("payload", doc, names);
        let manifest = embedded_manifest_path(&self.payload_dir(), PACKAGE);
        std::fs::create_dir_all(self.payload_dir()).unwrap();
        std::fs::write(manifest, doc.to_json().unwrap()).unwrap();
    }

    /// Publish `doc` on the remote mirror as the newest version
    pub fn publish(&self, doc: &ManifestDocument) {
        let names: Vec<&str> = doc.bundles.iter().map(|b| b.name.as_str()).collect();
        self.write_bundles("remote", doc, &names);
        self.write_file(
            &format!("remote/{PACKAGE}.version"),
            doc.package_version.as_bytes(),
        );
        self.write_file(
            &format!("remote/{PACKAGE}_{}.manifest.json", doc.package_version),
            doc.to_json().unwrap().as_bytes(),
        );
    }

    /// bundlepath.yaml for an offline package
    pub fn write_offline_config(&self) {
        self.write_file(
            "bundlepath.yaml",
            format!("package: {PACKAGE}\nmode: offline\npayload_dir: payload\ncache_dir: cache\n")
                .as_bytes(),
        );
    }

    /// bundlepath.yaml for a host package; the payload is optional
    pub fn write_host_config(&self) {
        self.write_file(
            "bundlepath.yaml",
            format!(
                "package: {PACKAGE}\nmode: host\nremote_dir: remote\npayload_dir: payload\n\
                 cache_dir: cache\nacquisition:\n  concurrency: 2\n  retry: 1\n  timeout_secs: 10\n"
            )
            .as_bytes(),
        );
    }

    /// Command running the real binary against this package's config
    pub fn cmd(&self) -> Command {
        let mut cmd = bundlepath_cmd();
        cmd.arg("-c").arg(self.config_path());
        cmd
    }
}

// Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
#[allow(deprecated)]
pub fn bundlepath_cmd() -> Command {
    let mut cmd = Command::cargo_bin("bundlepath").unwrap();
    cmd.env_remove("BUNDLEPATH_CONFIG")
        .env_remove("BUNDLEPATH_CACHE_DIR")
        .env_remove("RUST_LOG");
    cmd
}
