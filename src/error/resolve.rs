//! Resolution errors

use super::BundleError;

/// Creates an unknown asset error
pub fn unknown_asset(address: impl Into<String>) -> BundleError {
    BundleError::UnknownAsset {
        address: address.into(),
    }
}

/// Creates a service not ready error
pub fn not_ready(package: impl Into<String>) -> BundleError {
    BundleError::ServiceNotReady {
        package: package.into(),
    }
}

/// Creates an invalid address error
pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> BundleError {
    BundleError::InvalidAddress {
        address: address.into(),
        reason: reason.into(),
    }
}
