//! Manifest errors

use super::{BundleError, ValidationIssue};

/// Creates a manifest validation error
pub fn invalid(issue: ValidationIssue) -> BundleError {
    BundleError::ManifestValidation { issue }
}

/// Creates a malformed-document validation error
pub fn malformed(reason: impl Into<String>) -> BundleError {
    invalid(ValidationIssue::Malformed {
        reason: reason.into(),
    })
}

/// Creates a manifest update conflict error
pub fn update_conflict(package: impl Into<String>) -> BundleError {
    BundleError::ManifestUpdateConflict {
        package: package.into(),
    }
}
