//! Cache errors

use super::BundleError;

/// Creates a cache operation failed error
pub fn operation_failed(message: impl Into<String>) -> BundleError {
    BundleError::CacheOperationFailed {
        message: message.into(),
    }
}
