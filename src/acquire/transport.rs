//! Acquisition transport contract and the directory transport

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::NamedTempFile;

use crate::cache::paths;
use crate::error::{Result, acquire, fs as fs_err, operation};
use crate::hash;
use crate::manifest::PackageBundle;

/// One unit of transfer: a bundle with its expected checksum and size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub bundle: String,
    pub file_name: String,
    pub hash: String,
    pub size: u64,
}

impl From<&PackageBundle> for TransferRequest {
    fn from(bundle: &PackageBundle) -> Self {
        Self {
            bundle: bundle.name.clone(),
            file_name: bundle.file_name(),
            hash: bundle.hash.clone(),
            size: bundle.size,
        }
    }
}

/// Result of a successful transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub bytes: u64,
}

/// Moves one bundle into local storage
///
/// Each call is one attempt. Calls for different bundles run concurrently on
/// worker threads, so implementations must be thread-safe. An attempt should
/// stop early once `cancel` is raised: a timed-out attempt keeps its
/// concurrency slot until the call returns.
pub trait Transport: Send + Sync {
    fn transfer(&self, request: &TransferRequest, cancel: &AtomicBool) -> Result<TransferReceipt>;
}

/// Copy buffer size
const CHUNK: usize = 64 * 1024;

/// Transport that copies bundle files from a source directory into a cache
///
/// The copy is staged in a temporary file next to its destination and only
/// renamed into place once its size and checksum match, so the cache never
/// holds a partial bundle.
#[derive(Debug, Clone)]
pub struct DirTransport {
    source: PathBuf,
    cache_root: PathBuf,
}

impl DirTransport {
    /// `cache_root` is the per-package cache directory
    pub fn new(source: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            cache_root: cache_root.into(),
        }
    }
}

impl Transport for DirTransport {
    fn transfer(&self, request: &TransferRequest, cancel: &AtomicBool) -> Result<TransferReceipt> {
        let src = self.source.join(&request.file_name);
        let dest = paths::entry_path(&self.cache_root, &request.hash, &request.file_name);
        let dest_dir = dest
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.cache_root.clone());

        let file = File::open(&src).map_err(|e| {
            acquire::remote_fetch(src.display().to_string(), e.to_string())
        })?;
        fs::create_dir_all(&dest_dir)
            .map_err(|e| fs_err::write_failed(dest_dir.display().to_string(), e.to_string()))?;
        let mut staged = NamedTempFile::new_in(&dest_dir)
            .map_err(|e| fs_err::write_failed(dest_dir.display().to_string(), e.to_string()))?;

        let mut reader = BufReader::new(file);
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; CHUNK];
        let mut total = 0u64;

        loop {
            if cancel.load(Ordering::Relaxed) {
                return Err(operation::canceled(format!("transfer {}", request.bundle)));
            }
            let n = reader
                .read(&mut buffer)
                .map_err(|e| fs_err::read_failed(src.display().to_string(), e.to_string()))?;
            if n == 0 {
                break;
            }
            total += n as u64;
            // Oversized sources are rejected without copying the rest
            if total > request.size {
                return Err(acquire::integrity(
                    &request.bundle,
                    format!("size exceeds expected {} bytes", request.size),
                ));
            }
            hasher.update(&buffer[..n]);
            staged
                .write_all(&buffer[..n])
                .map_err(|e| fs_err::write_failed(dest.display().to_string(), e.to_string()))?;
        }

        if total != request.size {
            return Err(acquire::integrity(
                &request.bundle,
                format!("size {total}, expected {}", request.size),
            ));
        }
        let actual = format!("{}{}", hash::HASH_PREFIX, hasher.finalize().to_hex());
        if !hash::verify_hash(&request.hash, &actual) {
            return Err(acquire::integrity(
                &request.bundle,
                format!("checksum {actual}, expected {}", request.hash),
            ));
        }

        staged
            .persist(&dest)
            .map_err(|e| fs_err::write_failed(dest.display().to_string(), e.to_string()))?;

        Ok(TransferReceipt { bytes: total })
    }
}
