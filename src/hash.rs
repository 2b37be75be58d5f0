//! BLAKE3 hashing utilities for bundle integrity

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use blake3::Hasher;

use crate::error::{BundleError, Result};

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Length of a BLAKE3 digest in hex characters
const HEX_LEN: usize = 64;

/// Calculate BLAKE3 hash of an in-memory buffer
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{}{}", HASH_PREFIX, blake3::hash(bytes).to_hex())
}

/// Calculate BLAKE3 hash of a file, returning the hash and the byte count read
pub fn hash_file(path: &Path) -> Result<(String, u64)> {
    let file = File::open(path).map_err(|e| BundleError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; 8192];
    let mut total = 0u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| BundleError::FileReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if bytes_read == 0 {
            break;
        }

        total += bytes_read as u64;
        hasher.update(&buffer[..bytes_read]);
    }

    Ok((format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex()), total))
}

/// Strip the algorithm prefix, leaving the hex digest
pub fn hex_digest(hash: &str) -> &str {
    hash.strip_prefix(HASH_PREFIX).unwrap_or(hash)
}

/// Check that a hash string is a well-formed, prefixed BLAKE3 digest
pub fn is_valid_hash(hash: &str) -> bool {
    hash.strip_prefix(HASH_PREFIX)
        .is_some_and(|hex| hex.len() == HEX_LEN && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Verify a hash matches the expected value
pub fn verify_hash(expected: &str, actual: &str) -> bool {
    hex_digest(expected).eq_ignore_ascii_case(hex_digest(actual))
}
