//! Error types and handling for bundlepath
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`manifest`]: Manifest validation and activation errors
//! - [`resolve`]: Address and bundle resolution errors
//! - [`operation`]: Scheduler-level outcomes (timeout, cancel)
//! - [`acquire`]: Download/unpack and integrity errors
//! - [`config`]: Configuration errors
//! - [`fs`]: File system errors
//! - [`cache`]: Cache errors

pub mod acquire;
pub mod cache;
pub mod config;
pub mod fs;
pub mod manifest;
pub mod operation;
pub mod resolve;

use miette::Diagnostic;
use thiserror::Error;

/// Reason a manifest document was rejected at load time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("malformed manifest: {reason}")]
    Malformed { reason: String },

    #[error("duplicate bundle '{name}'")]
    DuplicateBundle { name: String },

    #[error("duplicate asset '{path}'")]
    DuplicateAsset { path: String },

    #[error("bundle '{bundle}' depends on unknown bundle '{dependency}'")]
    DanglingDependency { bundle: String, dependency: String },

    #[error("dependency cycle: {chain}")]
    DependencyCycle { chain: String },

    #[error("asset '{path}' is owned by unknown bundle '{bundle}'")]
    UnknownOwner { path: String, bundle: String },

    #[error("address '{address}' points at unknown asset '{target}'")]
    UnknownAddressTarget { address: String, target: String },

    #[error("addresses collide on '{address}' ('{first}' vs '{second}')")]
    AddressCollision {
        address: String,
        first: String,
        second: String,
    },

    #[error("bundle '{name}' has invalid hash '{hash}'")]
    InvalidHash { name: String, hash: String },
}

/// Main error type for bundlepath operations
#[derive(Error, Diagnostic, Debug, Clone)]
pub enum BundleError {
    // Resolution errors
    #[error("Unknown asset: {address}")]
    #[diagnostic(
        code(bundlepath::resolve::unknown_asset),
        help("Check the address against the active manifest ('bundlepath tags' lists assets)")
    )]
    UnknownAsset { address: String },

    #[error("Package '{package}' is not initialized")]
    #[diagnostic(
        code(bundlepath::resolve::not_ready),
        help("Run the package initialization operation to completion before resolving")
    )]
    ServiceNotReady { package: String },

    #[error("Invalid address '{address}': {reason}")]
    #[diagnostic(code(bundlepath::resolve::invalid_address))]
    InvalidAddress { address: String, reason: String },

    // Manifest errors
    #[error("Manifest validation failed: {issue}")]
    #[diagnostic(code(bundlepath::manifest::validation))]
    ManifestValidation { issue: ValidationIssue },

    #[error("Manifest update conflict for package '{package}'")]
    #[diagnostic(
        code(bundlepath::manifest::update_conflict),
        help("Another manifest was activated while this update was in flight")
    )]
    ManifestUpdateConflict { package: String },

    // Operation outcomes
    #[error("Operation '{operation}' timed out")]
    #[diagnostic(code(bundlepath::operation::timeout))]
    Timeout { operation: String },

    #[error("Operation '{operation}' was canceled")]
    #[diagnostic(code(bundlepath::operation::canceled))]
    Canceled { operation: String },

    // Acquisition errors
    #[error("Failed to acquire bundle '{bundle}' after {attempts} attempt(s): {reason}")]
    #[diagnostic(code(bundlepath::acquire::failed))]
    AcquisitionFailed {
        bundle: String,
        attempts: u32,
        reason: String,
    },

    #[error("Acquisition job finished with {failed} of {total} bundle(s) failed")]
    #[diagnostic(
        code(bundlepath::acquire::incomplete),
        help("Inspect the job report for per-bundle reasons and retry the failed bundles")
    )]
    AcquisitionIncomplete { failed: usize, total: usize },

    #[error("Integrity violation for bundle '{bundle}': {reason}")]
    #[diagnostic(code(bundlepath::acquire::integrity))]
    IntegrityViolation { bundle: String, reason: String },

    #[error("Failed to fetch {resource}: {reason}")]
    #[diagnostic(code(bundlepath::acquire::remote_fetch))]
    RemoteFetchFailed { resource: String, reason: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(bundlepath::config::not_found),
        help("Pass --config or create bundlepath.yaml in the current directory")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}")]
    #[diagnostic(code(bundlepath::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(bundlepath::config::invalid))]
    ConfigInvalid { message: String },

    // File system errors
    #[error("Failed to read file: {path}")]
    #[diagnostic(code(bundlepath::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(bundlepath::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(bundlepath::fs::io_error))]
    IoError { message: String },

    // Cache errors
    #[error("Cache operation failed: {message}")]
    #[diagnostic(code(bundlepath::cache::operation_failed))]
    CacheOperationFailed { message: String },
}

/// Coarse classification of a [`BundleError`], used by callers that branch on
/// the error class of a finished operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownAsset,
    ServiceNotReady,
    Validation,
    Timeout,
    Canceled,
    AcquisitionFailed,
    ManifestUpdateConflict,
    IntegrityViolation,
    Config,
    Io,
}

impl BundleError {
    /// Returns the error class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BundleError::UnknownAsset { .. } | BundleError::InvalidAddress { .. } => {
                ErrorKind::UnknownAsset
            }
            BundleError::ServiceNotReady { .. } => ErrorKind::ServiceNotReady,
            BundleError::ManifestValidation { .. } => ErrorKind::Validation,
            BundleError::ManifestUpdateConflict { .. } => ErrorKind::ManifestUpdateConflict,
            BundleError::Timeout { .. } => ErrorKind::Timeout,
            BundleError::Canceled { .. } => ErrorKind::Canceled,
            BundleError::AcquisitionFailed { .. }
            | BundleError::AcquisitionIncomplete { .. }
            | BundleError::RemoteFetchFailed { .. } => ErrorKind::AcquisitionFailed,
            BundleError::IntegrityViolation { .. } => ErrorKind::IntegrityViolation,
            BundleError::ConfigNotFound { .. }
            | BundleError::ConfigParseFailed { .. }
            | BundleError::ConfigInvalid { .. } => ErrorKind::Config,
            BundleError::FileReadFailed { .. }
            | BundleError::FileWriteFailed { .. }
            | BundleError::IoError { .. }
            | BundleError::CacheOperationFailed { .. } => ErrorKind::Io,
        }
    }

    /// Returns the validation issue when this is a manifest validation error.
    pub fn validation_issue(&self) -> Option<&ValidationIssue> {
        match self {
            BundleError::ManifestValidation { issue } => Some(issue),
            _ => None,
        }
    }
}

impl From<ValidationIssue> for BundleError {
    fn from(issue: ValidationIssue) -> Self {
        BundleError::ManifestValidation { issue }
    }
}

impl From<std::io::Error> for BundleError {
    fn from(err: std::io::Error) -> Self {
        BundleError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for BundleError {
    fn from(err: serde_yaml::Error) -> Self {
        BundleError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BundleError {
    fn from(err: serde_json::Error) -> Self {
        BundleError::ManifestValidation {
            issue: ValidationIssue::Malformed {
                reason: err.to_string(),
            },
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, BundleError>;
