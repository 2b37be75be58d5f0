//! Logical address to asset path mapping
//!
//! The manifest's own address index always wins. When an address is not in
//! the index, the resolver falls back to an [`AddressResolver`], whose output
//! must still name an asset the manifest knows.

use crate::error::{Result, resolve};

/// Characters that can never appear in an asset path
const ILLEGAL_CHARS: &[char] = &['"', '<', '>', '|', '\0'];

/// Maps a user-facing address to an internal asset path
pub trait AddressResolver: Send + Sync {
    /// Convert `address` into an asset path
    ///
    /// Malformed input fails; the resolver surfaces that as an unknown asset.
    fn resolve(&self, address: &str) -> Result<String>;
}

/// Address resolver that prefixes addresses with a resource root
///
/// With root `Assets/Game`, the address `hero/texture` maps to
/// `Assets/Game/hero/texture`. Without a root the address is used as-is.
#[derive(Debug, Clone, Default)]
pub struct DefaultAddressResolver {
    resource_root: Option<String>,
}

impl DefaultAddressResolver {
    pub fn new(resource_root: Option<&str>) -> Self {
        let resource_root = resource_root
            .map(|root| root.replace('\\', "/").trim_end_matches('/').to_string())
            .filter(|root| !root.is_empty());
        Self { resource_root }
    }

    pub fn resource_root(&self) -> Option<&str> {
        self.resource_root.as_deref()
    }
}

impl AddressResolver for DefaultAddressResolver {
    fn resolve(&self, address: &str) -> Result<String> {
        check_address(address)?;
        Ok(match &self.resource_root {
            Some(root) => format!("{root}/{address}"),
            None => address.to_string(),
        })
    }
}

fn check_address(address: &str) -> Result<()> {
    if address.trim().is_empty() {
        return Err(resolve::invalid_address(address, "address is empty"));
    }

    if let Some(c) = address
        .chars()
        .find(|c| ILLEGAL_CHARS.contains(c) || c.is_control())
    {
        tracing::warn!(address, "Found illegal character in address");
        return Err(resolve::invalid_address(
            address,
            format!("illegal character {c:?}"),
        ));
    }

    // Usually a typo; kept so the lookup fails with the exact address
    if address.ends_with(' ') {
        tracing::warn!(address, "Found trailing blank in address");
    }

    Ok(())
}
