//! Filesystem layer for Panel Provisioner
//!
//! Provides content checksums and the definition-file walker used by the
//! reconciliation engine.

pub mod checksum;
pub mod error;
pub mod walker;

pub use checksum::{compute_checksum, compute_file_checksum};
pub use error::{Error, Result};
pub use walker::{ELEMENT_FILE_EXTENSION, FileEntry, resolve_symlink, walk};
