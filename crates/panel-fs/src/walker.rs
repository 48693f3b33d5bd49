//! Directory traversal for element definition files
//!
//! Walks a source root collecting every definition file with its
//! modification time. Hidden directories are pruned without descending;
//! everything that is not a `.json` file is ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// Extension a file must carry to be picked up as an element definition.
pub const ELEMENT_FILE_EXTENSION: &str = "json";

/// Metadata recorded for one definition file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Last modification time reported by the filesystem.
    pub modified: DateTime<Utc>,
}

/// Walk `root` and collect all element definition files.
///
/// Directories whose name starts with `.` are excluded together with their
/// entire subtree. Other directories are descended into but never appear in
/// the result. Files are included only when they carry the
/// [`ELEMENT_FILE_EXTENSION`].
///
/// # Errors
///
/// Returns an error if `root` is not a directory or any directory in the
/// tree cannot be read.
pub fn walk(root: &Path) -> Result<BTreeMap<PathBuf, FileEntry>> {
    if !root.is_dir() {
        return Err(Error::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut found = BTreeMap::new();
    walk_dir(root, &mut found)?;
    Ok(found)
}

fn walk_dir(dir: &Path, found: &mut BTreeMap<PathBuf, FileEntry>) -> Result<()> {
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;

        if file_type.is_dir() {
            if is_hidden(&path) {
                continue;
            }
            walk_dir(&path, found)?;
            continue;
        }

        // Symlinks count as files here; their metadata is resolved later,
        // at the point of use.
        if !has_element_extension(&path) {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| Error::io(&path, e))?;
        let modified = metadata.modified().map_err(|e| Error::io(&path, e))?;
        found.insert(
            path,
            FileEntry {
                modified: modified.into(),
            },
        );
    }

    Ok(())
}

/// Re-read a file's metadata through its symlink target.
///
/// When the canonical path differs from `path`, the target's modification
/// time replaces the one recorded during the walk. Callers are expected to
/// fall back to the original entry when this fails; a broken link must not
/// abort a scan.
///
/// # Errors
///
/// Returns an error if the path cannot be canonicalized or the target's
/// metadata cannot be read.
pub fn resolve_symlink(path: &Path, entry: &FileEntry) -> Result<FileEntry> {
    let resolved = fs::canonicalize(path).map_err(|e| Error::io(path, e))?;
    if resolved == path {
        return Ok(entry.clone());
    }

    let metadata = fs::symlink_metadata(&resolved).map_err(|e| Error::io(&resolved, e))?;
    let modified = metadata.modified().map_err(|e| Error::io(&resolved, e))?;
    Ok(FileEntry {
        modified: modified.into(),
    })
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn has_element_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == ELEMENT_FILE_EXTENSION)
}
