//! On-disk manifest document (`<package>.manifest.json`)
//!
//! The document is the serialized form of a package version: every bundle
//! with its checksum, size, tags and dependency edges, every asset with its
//! owning bundle, and the logical address index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BundleError, Result, ValidationIssue};

/// A unit of loadable content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageBundle {
    /// Stable bundle identifier
    pub name: String,

    /// Content checksum (`blake3:<hex>`)
    pub hash: String,

    /// Size of the bundle file in bytes
    pub size: u64,

    /// Membership tags used for bulk selection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Bundles that must be loaded before this one, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl PackageBundle {
    /// File name used for this bundle in payload, remote and cache directories
    ///
    /// Path separators and drive colons are flattened so nested bundle names
    /// map onto a single file: `ui/common` -> `ui-common.bundle`.
    pub fn file_name(&self) -> String {
        format!("{}.bundle", self.name.replace(['/', '\\', ':'], "-"))
    }

    /// Whether any of the given tags is carried by this bundle
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// An addressable asset and its owning bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Internal asset path
    pub path: String,

    /// Name of the bundle that contains this asset
    pub bundle: String,

    /// Tags used for bulk queries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl AssetInfo {
    /// Whether any of the given tags is carried by this asset
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// Serialized manifest for one package version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDocument {
    /// Package this manifest belongs to
    pub package_name: String,

    /// Opaque version token
    pub package_version: String,

    #[serde(default)]
    pub bundles: Vec<PackageBundle>,

    #[serde(default)]
    pub assets: Vec<AssetInfo>,

    /// Logical address -> internal asset path
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub addresses: BTreeMap<String, String>,
}

impl ManifestDocument {
    /// Parse a manifest document from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| BundleError::ManifestValidation {
            issue: ValidationIssue::Malformed {
                reason: e.to_string(),
            },
        })
    }

    /// Serialize the document to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| BundleError::IoError {
            message: format!("Failed to serialize manifest: {e}"),
        })
    }
}
