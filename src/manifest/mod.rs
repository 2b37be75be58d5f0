//! Versioned package manifest
//!
//! A [`Manifest`] is an immutable, validated snapshot of one package version.
//! It is built once from a [`ManifestDocument`] and never mutated afterwards;
//! newer versions replace it wholesale through the mode's manifest slot.

pub mod document;
mod graph;
mod validation;

#[cfg(test)]
mod tests;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use document::{AssetInfo, ManifestDocument, PackageBundle};
pub use validation::validate;

/// Case normalization applied to logical addresses, fixed at initialization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressCase {
    /// Addresses are matched exactly
    #[default]
    Preserve,
    /// Addresses are lowercased before lookup
    Lower,
}

impl AddressCase {
    /// Apply this normalization to an address
    pub fn normalize(self, address: &str) -> Cow<'_, str> {
        match self {
            AddressCase::Preserve => Cow::Borrowed(address),
            AddressCase::Lower => Cow::Owned(address.to_lowercase()),
        }
    }
}

/// Validated, indexed manifest for one package version
#[derive(Debug, Clone)]
pub struct Manifest {
    package_name: String,
    version: String,
    address_case: AddressCase,
    bundles: Vec<PackageBundle>,
    bundle_index: HashMap<String, usize>,
    assets: Vec<AssetInfo>,
    asset_index: HashMap<String, usize>,
    /// Normalized address -> asset path
    addresses: HashMap<String, String>,
    file_names: HashSet<String>,
}

impl Manifest {
    /// Parse and validate raw manifest bytes
    ///
    /// Never coerces a broken document into an empty manifest: every problem
    /// is reported as a `ManifestValidation` error.
    pub fn load(bytes: &[u8], case: AddressCase) -> Result<Self> {
        let doc = ManifestDocument::from_json(bytes)?;
        Self::from_document(doc, case)
    }

    /// Validate a parsed document and build the lookup indices
    pub fn from_document(doc: ManifestDocument, case: AddressCase) -> Result<Self> {
        if let Err(issue) = validate(&doc, case) {
            tracing::warn!(
                package = %doc.package_name,
                version = %doc.package_version,
                %issue,
                "Rejected manifest"
            );
            return Err(issue.into());
        }

        let bundle_index = doc
            .bundles
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();
        let asset_index = doc
            .assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.path.clone(), i))
            .collect();
        let file_names = doc.bundles.iter().map(PackageBundle::file_name).collect();
        let addresses = doc
            .addresses
            .into_iter()
            .map(|(address, path)| (case.normalize(&address).into_owned(), path))
            .collect();

        Ok(Self {
            package_name: doc.package_name,
            version: doc.package_version,
            address_case: case,
            bundles: doc.bundles,
            bundle_index,
            assets: doc.assets,
            asset_index,
            addresses,
            file_names,
        })
    }

    /// Rebuild the serializable document
    pub fn to_document(&self) -> ManifestDocument {
        ManifestDocument {
            package_name: self.package_name.clone(),
            package_version: self.version.clone(),
            bundles: self.bundles.clone(),
            assets: self.assets.clone(),
            addresses: self
                .addresses
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Opaque version token; compared for identity only
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn address_case(&self) -> AddressCase {
        self.address_case
    }

    /// Bundles in manifest order
    pub fn bundles(&self) -> &[PackageBundle] {
        &self.bundles
    }

    /// Assets in manifest order
    pub fn assets(&self) -> &[AssetInfo] {
        &self.assets
    }

    pub fn bundle(&self, name: &str) -> Option<&PackageBundle> {
        self.bundle_index.get(name).map(|&i| &self.bundles[i])
    }

    pub fn asset(&self, path: &str) -> Option<&AssetInfo> {
        self.asset_index.get(path).map(|&i| &self.assets[i])
    }

    /// Look up a logical address in the manifest's own address index
    pub fn map_address(&self, address: &str) -> Option<&str> {
        self.addresses
            .get(self.address_case.normalize(address).as_ref())
            .map(String::as_str)
    }

    /// Bundle that owns the asset at `path`
    pub fn owning_bundle(&self, path: &str) -> Option<&PackageBundle> {
        self.asset(path).and_then(|a| self.bundle(&a.bundle))
    }

    /// Direct dependencies of a bundle, in declaration order
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.bundle(name)
            .map(|b| b.dependencies.as_slice())
            .unwrap_or_default()
    }

    /// Transitive dependencies of a bundle
    ///
    /// Depth-first over the dependency edges, first-seen order preserved,
    /// deduplicated, never including `name` itself.
    pub fn dependency_closure(&self, name: &str) -> Vec<&PackageBundle> {
        graph::closure(self, name)
    }

    /// Assets whose tag set intersects `tags`, in manifest order
    ///
    /// An empty tag list selects nothing.
    pub fn assets_by_tags(&self, tags: &[String]) -> Vec<&AssetInfo> {
        self.assets.iter().filter(|a| a.has_any_tag(tags)).collect()
    }

    /// Bundles whose tag set intersects `tags`, in manifest order
    pub fn bundles_by_tags(&self, tags: &[String]) -> Vec<&PackageBundle> {
        self.bundles.iter().filter(|b| b.has_any_tag(tags)).collect()
    }

    /// Whether a bundle file name belongs to this manifest
    pub fn contains_bundle_file(&self, file_name: &str) -> bool {
        self.file_names.contains(file_name)
    }
}
