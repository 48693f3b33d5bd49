//! SHA-256 checksum utilities
//!
//! Provides the single canonical checksum format (`sha256:<hex>`) stored in
//! provisioning metadata and compared across scans for change detection.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of a byte sequence.
///
/// Returns a string in the canonical format `"sha256:<hex>"`. Deterministic;
/// the same bytes always produce the same checksum.
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn compute_file_checksum(path: &Path) -> crate::Result<String> {
    let bytes = std::fs::read(path).map_err(|e| crate::Error::io(path, e))?;
    Ok(compute_checksum(&bytes))
}
