//! Error types for panel-core

use std::path::PathBuf;

/// Result type for panel-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in panel-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source's root directory cannot be read. Aborts the scan; the
    /// next tick retries.
    #[error("element source root {path} is not readable: {source}")]
    RootMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A definition file could not be read.
    #[error("failed to read element definition {path}: {source}")]
    ReadElement {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A definition file is not valid JSON.
    #[error("invalid element definition {path}: {source}")]
    ParseElement {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A folder lookup hit an element that is not a folder.
    #[error("expected folder {name:?}, found a panel element")]
    NotAFolder { name: String },

    /// `folder`/`folderUid` and `foldersFromFilesStructure` cannot be
    /// combined.
    #[error(
        "source {name:?}: 'folder' and 'folderUid' should be empty using 'foldersFromFilesStructure' option"
    )]
    ConflictingFolderOptions { name: String },

    /// The storage interface rejected an operation.
    #[error("storage operation failed: {message}")]
    Store { message: String },

    /// Filesystem error from panel-fs
    #[error(transparent)]
    Fs(#[from] panel_fs::Error),

    /// Configuration error from panel-config
    #[error(transparent)]
    Config(#[from] panel_config::Error),
}

impl Error {
    pub fn store(source: crate::store::StoreError) -> Self {
        Self::Store {
            message: source.to_string(),
        }
    }
}
