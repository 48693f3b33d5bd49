//! Error types for panel-config

use std::path::PathBuf;

/// Result type for panel-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading provisioning configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file carried `apiVersion >= 1` but its provider list did
    /// not match the expected shape.
    #[error("could not parse provisioning config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Two providers in one file share a name.
    #[error("element source name {name:?} is not unique")]
    DuplicateName { name: String },

    /// The options map has neither a `path` string nor the deprecated
    /// `folder` alias.
    #[error("failed to load element source {name:?}: path option is not a string")]
    MissingPath { name: String },

    /// The delegated organization check rejected a source.
    #[error("failed to provision source {name:?}: organization {org_id} not found")]
    UnknownOrg { name: String, org_id: i64 },

    /// The delegated organization check itself failed.
    #[error("organization lookup failed for source {name:?}: {message}")]
    OrgLookup { name: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
