//! Acquisition and integrity errors

use super::BundleError;

/// Creates a per-bundle acquisition failure
pub fn failed(bundle: impl Into<String>, attempts: u32, reason: impl Into<String>) -> BundleError {
    BundleError::AcquisitionFailed {
        bundle: bundle.into(),
        attempts,
        reason: reason.into(),
    }
}

/// Creates an aggregate job failure
pub fn incomplete(failed: usize, total: usize) -> BundleError {
    BundleError::AcquisitionIncomplete { failed, total }
}

/// Creates an integrity violation error
pub fn integrity(bundle: impl Into<String>, reason: impl Into<String>) -> BundleError {
    BundleError::IntegrityViolation {
        bundle: bundle.into(),
        reason: reason.into(),
    }
}

/// Creates a remote fetch error
pub fn remote_fetch(resource: impl Into<String>, reason: impl Into<String>) -> BundleError {
    BundleError::RemoteFetchFailed {
        resource: resource.into(),
        reason: reason.into(),
    }
}
