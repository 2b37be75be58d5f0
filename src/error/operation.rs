//! Operation outcome errors

use super::BundleError;

/// Creates a timeout error
pub fn timeout(operation: impl Into<String>) -> BundleError {
    BundleError::Timeout {
        operation: operation.into(),
    }
}

/// Creates a canceled error
pub fn canceled(operation: impl Into<String>) -> BundleError {
    BundleError::Canceled {
        operation: operation.into(),
    }
}
