//! Test fixtures shared by the unit test suites
//!
//! The sample package mirrors a small real layout:
//!
//! ```text
//! base   <- extra <- dlc
//! hero/texture  (base)
//! level/boss    (extra)
//! dlc/map       (dlc)
//! ```
//!
//! Bundle content is deterministic, so hashes and sizes in the manifest match
//! the files that [`write_bundles`] puts on disk.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::cache::CacheStore;
use crate::hash;
use crate::location::DefaultAddressResolver;
use crate::manifest::{AddressCase, AssetInfo, ManifestDocument, PackageBundle};
use crate::mode::{ManifestSlot, ModeContext, embedded_manifest_path};
use crate::operation::{OperationHandle, Scheduler};

pub const PACKAGE: &str = "default";

/// Deterministic content of a sample bundle
pub fn content(name: &str) -> Vec<u8> {
    format!("{name}-bundle-content").into_bytes()
}

/// Create a temp directory in the system temp location.
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
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

pub fn asset(path: &str, bundle: &str, tags: &[&str]) -> AssetInfo {
    AssetInfo {
        path: path.to_string(),
        bundle: bundle.to_string(),
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
    }
}

/// The sample package at `version`
pub fn sample_document(version: &str) -> ManifestDocument {
    let mut doc = ManifestDocument {
        package_name: PACKAGE.to_string(),
        package_version: version.to_string(),
        bundles: vec![
            bundle("base", &[], &["core"]),
            bundle("extra", &["base"], &["extra"]),
            bundle("dlc", &["extra"], &["dlc"]),
        ],
        assets: vec![
            asset("hero/texture", "base", &["hero"]),
            asset("level/boss", "extra", &["boss"]),
            asset("dlc/map", "dlc", &["dlc", "map"]),
        ],
        ..Default::default()
    };
    doc.addresses
        .insert("Hero".to_string(), "hero/texture".to_string());
    doc
}

pub fn sample_json(version: &str) -> Vec<u8> {
    sample_document(version).to_json().unwrap().into_bytes()
}

/// Write the named bundles' files into `dir`
pub fn write_bundles(dir: &Path, doc: &ManifestDocument, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for b in doc.bundles.iter().filter(|b| names.contains(&b.name.as_str())) {
        std::fs::write(dir.join(b.file_name()), content(&b.name)).unwrap();
    }
}

/// Payload directory with the embedded manifest and all bundle files
pub fn write_payload(dir: &Path, doc: &ManifestDocument) {
    let names: Vec<&str> = doc.bundles.iter().map(|b| b.name.as_str()).collect();
    write_bundles(dir, doc, &names);
    std::fs::write(
        embedded_manifest_path(dir, &doc.package_name),
        doc.to_json().unwrap(),
    )
    .unwrap();
}

/// Remote mirror publishing `doc` as the newest version
pub fn write_remote(dir: &Path, doc: &ManifestDocument) {
    write_payload(dir, doc);
    std::fs::write(
        dir.join(format!("{}.version", doc.package_name)),
        &doc.package_version,
    )
    .unwrap();
    std::fs::write(
        dir.join(format!(
            "{}_{}.manifest.json",
            doc.package_name, doc.package_version
        )),
        doc.to_json().unwrap(),
    )
    .unwrap();
}

pub fn context(cache: Arc<dyn CacheStore>) -> ModeContext {
    ModeContext {
        package: PACKAGE.to_string(),
        case: AddressCase::Preserve,
        slot: Arc::new(ManifestSlot::new(PACKAGE)),
        cache,
        addresses: Arc::new(DefaultAddressResolver::default()),
    }
}

/// Drive the scheduler until `handle` finishes
pub fn run<T>(scheduler: &mut Scheduler, handle: &OperationHandle<T>) {
    scheduler.run_until_complete(handle, Duration::from_millis(1));
}
