//! Content acquisition (download and unpack)
//!
//! An acquisition job moves a selected set of bundles into the local cache
//! through a [`Transport`]. Jobs run under the operation scheduler with a
//! concurrency bound, a per-item retry budget and a per-attempt timeout.
//! Failures are scoped to the bundle that failed; the job's
//! [`AcquisitionReport`] lists every item's outcome.

mod job;
mod transport;

#[cfg(test)]
mod tests;

use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::resolver::{BundleLocation, BundleResolver};

pub use job::{AcquisitionJob, AcquisitionReport, ItemReport, ItemStatus};
pub use transport::{DirTransport, TransferReceipt, TransferRequest, Transport};

/// What an acquisition job does with the selected bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquisitionKind {
    /// Fetch bundles that are neither cached nor embedded
    Download,
    /// Copy embedded bundles into the cache
    Unpack,
}

impl fmt::Display for AcquisitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionKind::Download => f.write_str("download"),
            AcquisitionKind::Unpack => f.write_str("unpack"),
        }
    }
}

/// Which bundles a job considers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    /// Bundles carrying any of these tags
    Tags(Vec<String>),
    /// Bundles needed to load these addresses, dependencies included
    Addresses(Vec<String>),
}

/// Caller-specified limits for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionOptions {
    /// Maximum transfers in flight at once
    pub concurrency: usize,
    /// Extra attempts per bundle after the first one fails
    pub retry: u32,
    /// Limit for a single attempt
    pub timeout: Duration,
}

impl Default for AcquisitionOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            retry: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Full description of a job to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionRequest {
    pub kind: AcquisitionKind,
    pub selector: Selector,
    pub options: AcquisitionOptions,
}

/// Work list for a job: selected bundles that still need `kind`
///
/// Download picks bundles that resolve to `MustAcquire`; unpack picks
/// embedded bundles that are not cached yet.
pub fn plan(
    resolver: &BundleResolver<'_>,
    kind: AcquisitionKind,
    selector: &Selector,
) -> Result<Vec<TransferRequest>> {
    let selected = resolver.select(selector)?;
    Ok(selected
        .into_iter()
        .filter(|bundle| match kind {
            AcquisitionKind::Download => {
                resolver.decide(bundle).location == BundleLocation::MustAcquire
            }
            AcquisitionKind::Unpack => {
                resolver.is_embedded(bundle) && !resolver.is_cached(bundle)
            }
        })
        .map(TransferRequest::from)
        .collect())
}
