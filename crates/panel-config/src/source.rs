//! Validated source configuration
//!
//! A [`SourceConfig`] is the normalized form of one provider entry: defaults
//! applied, the options map reduced to its typed fields, and per-file name
//! uniqueness enforced. One reconciliation engine binds to one source for
//! its entire lifetime; the struct is immutable after load.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::schema::RawSource;
use crate::{Error, Result};

/// Scan interval applied when a source leaves `updateIntervalSeconds`
/// unset or zero.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(10);

const DEFAULT_ORG_ID: i64 = 1;
const DEFAULT_KIND: &str = "file";

/// One configured root directory plus its provisioning policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Unique name of this source; provisioning metadata is keyed by it.
    pub name: String,
    /// Provider type. Only "file" sources exist today.
    pub kind: String,
    /// Organization the elements belong to.
    pub org_id: i64,
    /// Destination folder name for flat placement. Empty means root.
    pub folder: String,
    /// Unique id to stamp on the destination folder when it is created.
    pub folder_uid: String,
    /// Whether provisioned elements stay editable in the UI.
    pub editable: bool,
    /// Root directory holding the definition files.
    pub path: PathBuf,
    /// Mirror the on-disk directory structure into folders instead of
    /// using the single configured folder.
    pub folders_from_files_structure: bool,
    /// When set, elements missing on disk are unprovisioned instead of
    /// deleted.
    pub disable_deletion: bool,
    /// Time between scans.
    pub update_interval: Duration,
    /// Whether UI edits to provisioned elements are allowed.
    pub allow_ui_updates: bool,
}

impl SourceConfig {
    /// Normalize a whole provider list from one config file.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate provider name or on an entry whose options
    /// carry no usable `path`.
    pub fn from_providers(providers: Vec<RawSource>) -> Result<Vec<SourceConfig>> {
        let mut seen = BTreeSet::new();
        let mut sources = Vec::with_capacity(providers.len());

        for raw in providers {
            let name = raw.name.clone().unwrap_or_default();
            if !seen.insert(name.clone()) {
                return Err(Error::DuplicateName { name });
            }
            sources.push(SourceConfig::from_raw(raw)?);
        }

        Ok(sources)
    }

    fn from_raw(raw: RawSource) -> Result<SourceConfig> {
        let name = raw.name.unwrap_or_default();
        let options = raw.options.unwrap_or_default();

        let path = match (options.path, options.folder) {
            (Some(path), _) => path,
            (None, Some(folder)) => {
                tracing::warn!(
                    source = %name,
                    "the `folder` option is deprecated, use `path` instead"
                );
                folder
            }
            (None, None) => return Err(Error::MissingPath { name }),
        };

        let org_id = match raw.org_id.unwrap_or(0) {
            0 => DEFAULT_ORG_ID,
            id => id,
        };

        let kind = match raw.kind.unwrap_or_default() {
            k if k.is_empty() => DEFAULT_KIND.to_string(),
            k => k,
        };

        let update_interval = match raw.update_interval_seconds.unwrap_or(0) {
            n if n <= 0 => DEFAULT_UPDATE_INTERVAL,
            n => Duration::from_secs(n as u64),
        };

        Ok(SourceConfig {
            name,
            kind,
            org_id,
            folder: raw.folder.unwrap_or_default(),
            folder_uid: raw.folder_uid.unwrap_or_default(),
            editable: raw.editable.unwrap_or_default(),
            path: PathBuf::from(path),
            folders_from_files_structure: options.folders_from_files_structure.unwrap_or_default(),
            disable_deletion: raw.disable_deletion.unwrap_or_default(),
            update_interval,
            allow_ui_updates: raw.allow_ui_updates.unwrap_or_default(),
        })
    }
}
