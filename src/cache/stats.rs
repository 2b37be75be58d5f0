//! Cache statistics

use std::path::Path;

use walkdir::WalkDir;

use crate::error::{BundleError, Result};

/// Cache statistics for one package directory
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of cached bundle files
    pub entries: usize,
    /// Total size in bytes
    pub total_size: u64,
}

impl CacheStats {
    /// Walk a package cache directory and count bundle files
    pub fn collect(root: &Path) -> Result<Self> {
        let mut stats = Self::default();
        if !root.exists() {
            return Ok(stats);
        }

        for entry in WalkDir::new(root).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| BundleError::CacheOperationFailed {
                message: format!("Failed to walk cache directory {}: {}", root.display(), e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let metadata = entry
                .metadata()
                .map_err(|e| BundleError::CacheOperationFailed {
                    message: format!("Failed to stat {}: {}", entry.path().display(), e),
                })?;
            stats.entries += 1;
            stats.total_size += metadata.len();
        }

        Ok(stats)
    }

    /// Total size in the largest binary unit below 1024, e.g. `5.0 MB`
    #[allow(clippy::cast_precision_loss)]
    pub fn formatted_size(&self) -> String {
        const UNITS: [&str; 3] = ["KB", "MB", "GB"];

        if self.total_size < 1024 {
            return format!("{} B", self.total_size);
        }
        let mut scaled = self.total_size as f64 / 1024.0;
        let mut unit = 0;
        while scaled >= 1024.0 && unit + 1 < UNITS.len() {
            scaled /= 1024.0;
            unit += 1;
        }
        format!("{scaled:.1} {}", UNITS[unit])
    }
}
