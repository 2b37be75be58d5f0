//! In-memory cache store

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use crate::manifest::PackageBundle;

use super::CacheStore;

/// Cache membership tracked by bundle name
///
/// Useful for hosts that manage their own storage and only need to tell the
/// resolver what is present.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    cached: RwLock<HashSet<String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given bundle names
    pub fn with_bundles<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cached: RwLock::new(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Mark a bundle as cached
    pub fn insert(&self, name: impl Into<String>) {
        self.cached
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into());
    }

    /// Forget a bundle, returning whether it was cached
    pub fn remove(&self, name: &str) -> bool {
        self.cached
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }
}

impl CacheStore for MemoryCacheStore {
    fn is_cached(&self, bundle: &PackageBundle) -> bool {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&bundle.name)
    }
}
