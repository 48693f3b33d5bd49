//! Definition file loading
//!
//! Turns one file on disk into a persistence-ready save command plus the
//! checksum used for change detection. A failure here is always a per-file
//! condition; the engine logs it and moves on to the next file.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use panel_config::SourceConfig;
use serde_json::Value;

use crate::element::{ElementModel, SaveElementCommand};
use crate::{Error, Result};

/// One loaded definition file.
#[derive(Debug, Clone)]
pub struct ElementFile {
    pub command: SaveElementCommand,
    pub checksum: String,
    pub last_modified: DateTime<Utc>,
}

/// Read, checksum, and parse one definition file.
///
/// The resulting command is stamped with the owning org, the resolved
/// destination folder, `overwrite = true`, and the file's modification time
/// as the element's update timestamp.
///
/// # Errors
///
/// Fails if the file cannot be read or is not valid JSON.
pub fn load_element_file(
    path: &Path,
    last_modified: DateTime<Utc>,
    folder_id: i64,
    cfg: &SourceConfig,
) -> Result<ElementFile> {
    let bytes = fs::read(path).map_err(|source| Error::ReadElement {
        path: path.to_path_buf(),
        source,
    })?;

    let checksum = panel_fs::compute_checksum(&bytes);

    let data: Value = serde_json::from_slice(&bytes).map_err(|source| Error::ParseElement {
        path: path.to_path_buf(),
        source,
    })?;

    let mut element = ElementModel::from_json(data);
    element.org_id = cfg.org_id;
    element.folder_id = folder_id;

    Ok(ElementFile {
        command: SaveElementCommand {
            element,
            org_id: cfg.org_id,
            overwrite: true,
            updated_at: last_modified,
        },
        checksum,
        last_modified,
    })
}
