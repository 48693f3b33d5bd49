//! Reader for a directory of provisioning config files

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::schema::{RawConfigFile, VersionProbe};
use crate::{Error, Result, SourceConfig};

/// Extensions recognized as provisioning config files.
const CONFIG_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Delegated check that an organization referenced by a source exists.
#[async_trait]
pub trait OrgLookup: Send + Sync {
    /// Whether `org_id` names a known organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself cannot be performed.
    async fn org_exists(
        &self,
        org_id: i64,
    ) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// Reads every config file in a directory into validated sources.
pub struct ConfigReader {
    path: PathBuf,
}

impl ConfigReader {
    /// Create a reader over the given provisioning config directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and validate all source definitions.
    ///
    /// An unreadable config directory is logged and yields an empty set;
    /// a background provisioner with no config simply has nothing to do.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable config file, a duplicate source name within
    /// one file, or a source referencing an unknown organization.
    pub async fn read_config(&self, orgs: &dyn OrgLookup) -> Result<Vec<SourceConfig>> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::error!(
                    path = %self.path.display(),
                    %error,
                    "cannot read element provisioning config directory"
                );
                return Ok(Vec::new());
            }
        };

        let mut sources = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.path, e))?;
            let path = entry.path();
            if !is_config_file(&path) {
                continue;
            }
            sources.extend(self.parse_file(&path)?);
        }

        for source in &sources {
            match orgs.org_exists(source.org_id).await {
                Ok(true) => {}
                Ok(false) => {
                    return Err(Error::UnknownOrg {
                        name: source.name.clone(),
                        org_id: source.org_id,
                    });
                }
                Err(error) => {
                    return Err(Error::OrgLookup {
                        name: source.name.clone(),
                        message: error.to_string(),
                    });
                }
            }
        }

        warn_on_folder_uid_collisions(&sources);
        Ok(sources)
    }

    /// Parse one config file into zero or more sources.
    ///
    /// The version probe tolerates malformed documents: anything that does
    /// not announce `apiVersion >= 1` is treated as the unsupported legacy
    /// shape and yields no sources.
    fn parse_file(&self, path: &Path) -> Result<Vec<SourceConfig>> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        let version: VersionProbe = serde_yaml::from_str(&contents).unwrap_or_default();
        if version.api_version < 1 {
            tracing::debug!(
                path = %path.display(),
                "skipping legacy provisioning config file"
            );
            return Ok(Vec::new());
        }

        let file: RawConfigFile =
            serde_yaml::from_str(&contents).map_err(|e| Error::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        SourceConfig::from_providers(file.providers)
    }
}

fn is_config_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext))
}

/// The same folder UID configured for two sources will make them fight over
/// one folder. Advisory only; provisioning proceeds.
fn warn_on_folder_uid_collisions(sources: &[SourceConfig]) {
    let mut usage: BTreeMap<&str, u32> = BTreeMap::new();
    for source in sources {
        if !source.folder_uid.is_empty() {
            *usage.entry(source.folder_uid.as_str()).or_default() += 1;
        }
    }

    for (folder_uid, times) in usage {
        if times > 1 {
            tracing::warn!(%folder_uid, %times, "the same folder UID is used more than once");
        }
    }
}
