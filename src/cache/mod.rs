//! Local bundle cache
//!
//! The resolver only ever asks the cache one question: is this bundle already
//! materialized locally? That contract is the [`CacheStore`] trait. Two stores
//! ship with the crate: [`DirCacheStore`] over an on-disk layout and
//! [`MemoryCacheStore`] for hosts that track membership themselves.
//!
//! ## Cache Structure
//!
//! ```text
//! ~/.cache/bundlepath/
//! └── <package>/
//!     └── <blake3-hex>/
//!         └── <bundle-file-name>
//! ```
//!
//! Keying entries by content hash means a new manifest version that changes a
//! bundle never observes the stale file under the same path.

mod dir;
mod memory;
pub mod paths;
pub mod stats;


pub use dir::{DirCacheStore, check_file};
pub use memory::MemoryCacheStore;
pub use paths::{cache_dir, resolve_cache_root};
pub use stats::CacheStats;

use crate::manifest::PackageBundle;

/// Outcome of checking one cached bundle against its manifest record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCheck {
    Intact,
    Missing,
    Corrupt(String),
}

/// Membership query over locally materialized bundles
///
/// Implementations must be safe to query concurrently; the resolver never
/// writes through this trait.
pub trait CacheStore: Send + Sync {
    /// Whether the bundle is fully present locally
    fn is_cached(&self, bundle: &PackageBundle) -> bool;

    /// Check a bundle's cached content against its size and checksum
    ///
    /// Stores that do not track content fall back to membership.
    fn verify(&self, bundle: &PackageBundle) -> CacheCheck {
        if self.is_cached(bundle) {
            CacheCheck::Intact
        } else {
            CacheCheck::Missing
        }
    }
}
