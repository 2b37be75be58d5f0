//! Configuration file handling
//!
//! A package is described by `bundlepath.yaml`:
//!
//! ```yaml
//! package: default
//! mode: host              # offline | host
//! address_case: preserve  # preserve | lower
//! resource_root: Assets
//! payload_dir: payload    # embedded manifest and bundles
//! remote_dir: mirror      # host mode only
//! cache_dir: .cache       # optional
//! acquisition:
//!   concurrency: 4
//!   retry: 2
//!   timeout_secs: 60
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

mod package;


pub use package::{AcquisitionConfig, CONFIG_FILE, PackageConfig};
