//! Reconciliation engine
//!
//! One engine serves one configured source for its entire lifetime. A scan
//! walks the source's directory tree, compares it against the provisioning
//! refs the store holds for this source, and applies the difference:
//! elements are created, overwritten, deleted, or unprovisioned so the
//! store ends up matching the disk.
//!
//! Failures while establishing the scan (root resolution, ref fetch, walk)
//! abort it; the next tick retries. Failures on a single file or ref are
//! recorded in the [`ScanReport`] and never block the rest of the tree.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use panel_config::SourceConfig;
use panel_fs::{FileEntry, resolve_symlink, walk};

use crate::element::{ElementIdentity, ProvisionInfo, ProvisionedElementRef, ProvisioningMetadata};
use crate::folder::FolderResolver;
use crate::loader::load_element_file;
use crate::store::ElementStore;
use crate::usage::UsageTracker;
use crate::{Error, Result};

use super::report::{ScanAction, ScanReport};

/// State shared between the scan task and introspection readers.
#[derive(Debug, Default)]
struct ScanState {
    usage_tracker: UsageTracker,
    write_access_restricted: bool,
}

/// Reconciles one source's definition files into the store.
pub struct SyncEngine {
    cfg: SourceConfig,
    store: Arc<dyn ElementStore>,
    state: RwLock<ScanState>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("cfg", &self.cfg)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Create an engine for one source.
    ///
    /// # Errors
    ///
    /// Fails when the source combines `foldersFromFilesStructure` with a
    /// configured folder name and folder uid; the two placement policies
    /// are mutually exclusive.
    pub fn new(cfg: SourceConfig, store: Arc<dyn ElementStore>) -> Result<Self> {
        if cfg.folders_from_files_structure && !cfg.folder.is_empty() && !cfg.folder_uid.is_empty()
        {
            return Err(Error::ConflictingFolderOptions {
                name: cfg.name.clone(),
            });
        }

        Ok(Self {
            cfg,
            store,
            state: RwLock::new(ScanState::default()),
        })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.cfg
    }

    /// Snapshot of the usage tracker published by the last completed scan.
    pub fn usage_tracker(&self) -> UsageTracker {
        self.read_state().usage_tracker.clone()
    }

    /// Suppress or re-enable store writes. Scans keep running read-only
    /// while restricted, e.g. during maintenance windows.
    pub fn set_write_access_restricted(&self, restrict: bool) {
        self.write_state().write_access_restricted = restrict;
    }

    pub fn is_write_access_restricted(&self) -> bool {
        self.read_state().write_access_restricted
    }

    /// Run one full reconciliation pass.
    ///
    /// # Errors
    ///
    /// Fails when the source root cannot be read, the provisioning refs
    /// cannot be fetched, the walk fails, or flat-mode folder resolution
    /// fails. Per-item failures land in the report instead.
    pub async fn reconcile(&self) -> Result<ScanReport> {
        tracing::debug!(source = %self.cfg.name, path = %self.cfg.path.display(), "start walking disk");

        let root = self.resolved_root();
        fs::metadata(&root).map_err(|source| Error::RootMissing {
            path: root.clone(),
            source,
        })?;

        let refs = self
            .store
            .provisioned_elements(&self.cfg.name)
            .await
            .map_err(Error::store)?;
        let refs_by_path: HashMap<String, ProvisionedElementRef> = refs
            .into_iter()
            .map(|r| (r.external_id.clone(), r))
            .collect();

        let files_on_disk = walk(&root)?;

        let mut report = ScanReport::default();
        self.remove_missing_elements(&refs_by_path, &files_on_disk, &mut report)
            .await;

        let mut tracker = UsageTracker::new();
        if self.cfg.folders_from_files_structure {
            self.store_elements_mirrored(&files_on_disk, &refs_by_path, &root, &mut tracker, &mut report)
                .await?;
        } else {
            self.store_elements_flat(&files_on_disk, &refs_by_path, &mut tracker, &mut report)
                .await?;
        }

        self.warn_on_duplicates(&tracker);
        self.write_state().usage_tracker = tracker;

        Ok(report)
    }

    /// Unprovision or delete every ref whose file is gone from disk.
    ///
    /// Each removal stands alone; one failure is recorded and the rest
    /// proceed.
    async fn remove_missing_elements(
        &self,
        refs_by_path: &HashMap<String, ProvisionedElementRef>,
        files_on_disk: &BTreeMap<PathBuf, FileEntry>,
        report: &mut ScanReport,
    ) {
        let mut missing: Vec<&ProvisionedElementRef> = refs_by_path
            .values()
            .filter(|r| !files_on_disk.contains_key(Path::new(&r.external_id)))
            .collect();
        missing.sort_by(|a, b| a.external_id.cmp(&b.external_id));

        for stale in missing {
            if self.cfg.disable_deletion {
                tracing::debug!(
                    source = %self.cfg.name,
                    element_id = stale.element_id,
                    "unprovisioning element, missing on disk"
                );
                match self.store.unprovision_element(stale.element_id).await {
                    Ok(()) => report.record(&stale.external_id, ScanAction::Unprovisioned),
                    Err(error) => {
                        tracing::error!(
                            source = %self.cfg.name,
                            element_id = stale.element_id,
                            %error,
                            "failed to unprovision element"
                        );
                        report.record(
                            &stale.external_id,
                            ScanAction::Failed {
                                reason: error.to_string(),
                            },
                        );
                    }
                }
            } else {
                tracing::debug!(
                    source = %self.cfg.name,
                    element_id = stale.element_id,
                    "deleting provisioned element, missing on disk"
                );
                match self
                    .store
                    .delete_provisioned_element(stale.element_id, self.cfg.org_id)
                    .await
                {
                    Ok(()) => report.record(&stale.external_id, ScanAction::Deleted),
                    Err(error) => {
                        tracing::error!(
                            source = %self.cfg.name,
                            element_id = stale.element_id,
                            %error,
                            "failed to delete element"
                        );
                        report.record(
                            &stale.external_id,
                            ScanAction::Failed {
                                reason: error.to_string(),
                            },
                        );
                    }
                }
            }
        }
    }

    /// Flat placement: every file goes to the single configured folder.
    ///
    /// The folder is resolved once; its failure gates every file in the
    /// source and therefore aborts the scan.
    async fn store_elements_flat(
        &self,
        files_on_disk: &BTreeMap<PathBuf, FileEntry>,
        refs_by_path: &HashMap<String, ProvisionedElementRef>,
        tracker: &mut UsageTracker,
        report: &mut ScanReport,
    ) -> Result<()> {
        let resolver = FolderResolver::new(self.store.as_ref(), &self.cfg);
        let folder_id = resolver.resolve(&self.cfg.folder).await?.unwrap_or(0);

        for (path, entry) in files_on_disk {
            match self
                .save_element(path, entry, folder_id, refs_by_path, tracker)
                .await
            {
                Ok(action) => report.record(path, action),
                Err(error) => {
                    tracing::error!(source = %self.cfg.name, path = %path.display(), %error, "failed to save element");
                    report.record(
                        path,
                        ScanAction::Failed {
                            reason: error.to_string(),
                        },
                    );
                }
            }
        }

        Ok(())
    }

    /// Mirrored placement: each file's folder is its parent directory's
    /// name; files directly under the root stay unfoldered.
    async fn store_elements_mirrored(
        &self,
        files_on_disk: &BTreeMap<PathBuf, FileEntry>,
        refs_by_path: &HashMap<String, ProvisionedElementRef>,
        root: &Path,
        tracker: &mut UsageTracker,
        report: &mut ScanReport,
    ) -> Result<()> {
        let resolver = FolderResolver::new(self.store.as_ref(), &self.cfg);

        for (path, entry) in files_on_disk {
            let folder_name = folder_name_for(path, root);

            let folder_id = match resolver.resolve(&folder_name).await {
                Ok(id) => id.unwrap_or(0),
                Err(error) => {
                    tracing::error!(
                        source = %self.cfg.name,
                        folder = %folder_name,
                        path = %path.display(),
                        %error,
                        "can't provision folder from file structure"
                    );
                    report.record(
                        path,
                        ScanAction::Failed {
                            reason: error.to_string(),
                        },
                    );
                    continue;
                }
            };

            match self
                .save_element(path, entry, folder_id, refs_by_path, tracker)
                .await
            {
                Ok(action) => report.record(path, action),
                Err(error) => {
                    tracing::error!(source = %self.cfg.name, path = %path.display(), %error, "failed to save element");
                    report.record(
                        path,
                        ScanAction::Failed {
                            reason: error.to_string(),
                        },
                    );
                }
            }
        }

        Ok(())
    }

    /// Create or update one element, or skip it when nothing changed.
    async fn save_element(
        &self,
        path: &Path,
        entry: &FileEntry,
        folder_id: i64,
        refs_by_path: &HashMap<String, ProvisionedElementRef>,
        tracker: &mut UsageTracker,
    ) -> Result<ScanAction> {
        let entry = match resolve_symlink(path, entry) {
            Ok(resolved) => resolved,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to resolve symlink, using walked metadata");
                entry.clone()
            }
        };

        let external_id = path.to_string_lossy().into_owned();
        let provisioned = refs_by_path.get(&external_id);

        let file = load_element_file(path, entry.modified, folder_id, &self.cfg)?;

        // A record never provisioned under this source is never up to
        // date, even when an identical element exists elsewhere.
        let up_to_date = provisioned.is_some_and(|p| p.checksum == file.checksum);

        tracker.track(&ProvisioningMetadata {
            uid: file.command.element.uid.clone(),
            identity: ElementIdentity {
                title: file.command.element.title.clone(),
                folder_id: file.command.element.folder_id,
            },
        });

        if up_to_date {
            return Ok(ScanAction::UpToDate);
        }

        let mut command = file.command;
        if command.element.id != 0 {
            command.element.clear_id();
        }
        if let Some(p) = provisioned {
            command.element.set_id(p.element_id);
        }

        if self.is_write_access_restricted() {
            tracing::warn!(
                source = %self.cfg.name,
                path = %path.display(),
                folder_id = command.element.folder_id,
                "not saving element due to restricted write access"
            );
            return Ok(ScanAction::SkippedWriteRestricted);
        }

        tracing::debug!(
            source = %self.cfg.name,
            path = %path.display(),
            folder_id = command.element.folder_id,
            "saving element"
        );
        self.store
            .save_provisioned_element(
                command,
                ProvisionInfo {
                    external_id,
                    name: self.cfg.name.clone(),
                    updated: file.last_modified,
                    checksum: file.checksum,
                },
            )
            .await
            .map_err(Error::store)?;

        Ok(if provisioned.is_some() {
            ScanAction::Updated
        } else {
            ScanAction::Created
        })
    }

    /// Absolute, symlink-resolved source root. Resolution failures fall
    /// back to the configured path; whether that path is usable is decided
    /// by the caller's existence check.
    fn resolved_root(&self) -> PathBuf {
        match fs::canonicalize(&self.cfg.path) {
            Ok(resolved) => resolved,
            Err(error) => {
                tracing::info!(
                    path = %self.cfg.path.display(),
                    %error,
                    "falling back to configured path, canonicalize failed"
                );
                self.cfg.path.clone()
            }
        }
    }

    fn warn_on_duplicates(&self, tracker: &UsageTracker) {
        for (uid, times) in tracker.duplicate_uids() {
            tracing::warn!(source = %self.cfg.name, %uid, %times, "the same element uid is used more than once");
        }
        for (identity, times) in tracker.duplicate_identities() {
            tracing::warn!(
                source = %self.cfg.name,
                title = %identity.title,
                folder_id = identity.folder_id,
                %times,
                "the same element title is used more than once in a folder"
            );
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ScanState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ScanState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Folder name for a file in mirrored mode: the immediate parent directory
/// name, or empty for files directly under the root.
fn folder_name_for(path: &Path, root: &Path) -> String {
    let parent = match path.parent() {
        Some(parent) if parent != root => parent,
        _ => return String::new(),
    };

    parent
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
