//! Bundle resolution and cache-tier decisions
//!
//! The resolver turns a logical address into the bundle that owns it, plus
//! that bundle's transitive dependencies, and decides for each bundle where it
//! loads from:
//!
//! 1. Present in the cache store: [`BundleLocation::FromCache`]
//! 2. Otherwise, embedded in the package payload according to the active
//!    mode: [`BundleLocation::FromPackagePayload`]
//! 3. Otherwise: [`BundleLocation::MustAcquire`]
//!
//! Decisions are pure functions of the manifest and the cache state at the
//! time of the call. Unknown or malformed addresses always fail with
//! `UnknownAsset`; there is no empty fallback.


use std::collections::HashSet;

use crate::acquire::Selector;
use crate::cache::CacheStore;
use crate::error::{Result, resolve};
use crate::location::AddressResolver;
use crate::manifest::{AssetInfo, Manifest, PackageBundle};
use crate::mode::PlayMode;

/// Where a bundle is loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleLocation {
    FromCache,
    FromPackagePayload,
    MustAcquire,
}

/// Resolution result for one bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleDecision {
    pub location: BundleLocation,
    pub bundle: PackageBundle,
}

/// A resolved address: owning bundle and its dependency closure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub asset_path: String,
    pub bundle: String,
    /// Transitive dependencies, depth-first, first-seen order, deduplicated
    pub dependencies: Vec<String>,
}

/// Resolver over one manifest snapshot
pub struct BundleResolver<'a> {
    manifest: &'a Manifest,
    cache: &'a dyn CacheStore,
    mode: &'a dyn PlayMode,
    addresses: &'a dyn AddressResolver,
}

impl<'a> BundleResolver<'a> {
    pub fn new(
        manifest: &'a Manifest,
        cache: &'a dyn CacheStore,
        mode: &'a dyn PlayMode,
        addresses: &'a dyn AddressResolver,
    ) -> Self {
        Self {
            manifest,
            cache,
            mode,
            addresses,
        }
    }

    pub fn manifest(&self) -> &'a Manifest {
        self.manifest
    }

    /// Map an address to the asset path it names
    ///
    /// The manifest's address index takes precedence; the address resolver is
    /// only consulted for addresses the index does not know, and its output
    /// must still be an asset of this manifest.
    pub fn asset_path(&self, address: &str) -> Result<&'a str> {
        if let Some(path) = self.manifest.map_address(address) {
            return Ok(path);
        }

        let path = self.addresses.resolve(address).map_err(|e| {
            tracing::debug!(address, error = %e, "Address resolver rejected address");
            resolve::unknown_asset(address)
        })?;

        self.manifest
            .asset(&path)
            .map(|asset| asset.path.as_str())
            .ok_or_else(|| resolve::unknown_asset(address))
    }

    /// Like [`asset_path`](Self::asset_path) without the error
    pub fn try_asset_path(&self, address: &str) -> Option<&'a str> {
        self.asset_path(address).ok()
    }

    /// Resolve an address to its owning bundle and dependency closure
    pub fn reference(&self, address: &str) -> Result<AssetReference> {
        let owner = self.owner(address)?;
        Ok(AssetReference {
            asset_path: self.asset_path(address)?.to_string(),
            bundle: owner.name.clone(),
            dependencies: self
                .manifest
                .dependency_closure(&owner.name)
                .into_iter()
                .map(|b| b.name.clone())
                .collect(),
        })
    }

    /// Decide where a single bundle loads from
    pub fn decide(&self, bundle: &PackageBundle) -> BundleDecision {
        let location = if self.cache.is_cached(bundle) {
            BundleLocation::FromCache
        } else if self.mode.is_embedded(bundle) {
            BundleLocation::FromPackagePayload
        } else {
            BundleLocation::MustAcquire
        };
        BundleDecision {
            location,
            bundle: bundle.clone(),
        }
    }

    /// Decision for the bundle that owns `address`
    pub fn resolve_bundle(&self, address: &str) -> Result<BundleDecision> {
        Ok(self.decide(self.owner(address)?))
    }

    /// Decisions for every transitive dependency of the owning bundle
    ///
    /// The owning bundle itself is not part of the result; a leaf asset yields
    /// an empty list.
    pub fn resolve_dependencies(&self, address: &str) -> Result<Vec<BundleDecision>> {
        let owner = self.owner(address)?;
        Ok(self
            .manifest
            .dependency_closure(&owner.name)
            .into_iter()
            .map(|bundle| self.decide(bundle))
            .collect())
    }

    /// Assets whose tags intersect `tags`, in manifest order
    ///
    /// An empty tag list selects nothing, never everything.
    pub fn query_by_tags(&self, tags: &[String]) -> Vec<AssetInfo> {
        self.manifest
            .assets_by_tags(tags)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Bundles covered by an acquisition selector, in first-seen order
    pub fn select(&self, selector: &Selector) -> Result<Vec<&'a PackageBundle>> {
        match selector {
            Selector::All => Ok(self.manifest.bundles().iter().collect()),
            Selector::Tags(tags) => Ok(self.manifest.bundles_by_tags(tags)),
            Selector::Addresses(addresses) => {
                let mut seen = HashSet::new();
                let mut selected = Vec::new();
                for address in addresses {
                    let owner = self.owner(address)?;
                    let closure = self.manifest.dependency_closure(&owner.name);
                    for bundle in std::iter::once(owner).chain(closure) {
                        if seen.insert(bundle.name.as_str()) {
                            selected.push(bundle);
                        }
                    }
                }
                Ok(selected)
            }
        }
    }

    pub fn is_cached(&self, bundle: &PackageBundle) -> bool {
        self.cache.is_cached(bundle)
    }

    pub fn is_embedded(&self, bundle: &PackageBundle) -> bool {
        self.mode.is_embedded(bundle)
    }

    fn owner(&self, address: &str) -> Result<&'a PackageBundle> {
        let path = self.asset_path(address)?;
        self.manifest
            .owning_bundle(path)
            .ok_or_else(|| resolve::unknown_asset(address))
    }
}
