//! Destination folder resolution
//!
//! Folders are ordinary elements in the store, looked up by slugified
//! title. Resolution is deliberately uncached: folder count is small next
//! to element count, and a stale cache would fight the store.

use chrono::Utc;
use panel_config::SourceConfig;

use crate::element::{ElementModel, SaveElementCommand};
use crate::store::ElementStore;
use crate::{Error, Result};

/// Resolves folder names to store ids for one source.
pub struct FolderResolver<'a> {
    store: &'a dyn ElementStore,
    cfg: &'a SourceConfig,
}

impl<'a> FolderResolver<'a> {
    pub fn new(store: &'a dyn ElementStore, cfg: &'a SourceConfig) -> Self {
        Self { store, cfg }
    }

    /// Resolve a folder name to an id, creating the folder when absent.
    ///
    /// An empty name means "no folder specified" and resolves to `None`;
    /// the caller places such elements at the root.
    ///
    /// # Errors
    ///
    /// Fails when the lookup hits a non-folder element (fatal
    /// misconfiguration) or the store rejects the lookup/create.
    pub async fn resolve(&self, folder_name: &str) -> Result<Option<i64>> {
        if folder_name.is_empty() {
            return Ok(None);
        }

        let existing = self
            .store
            .find_element_by_slug(&slugify(folder_name), self.cfg.org_id)
            .await
            .map_err(Error::store)?;

        if let Some(hit) = existing {
            if !hit.is_folder {
                return Err(Error::NotAFolder {
                    name: folder_name.to_string(),
                });
            }
            return Ok(Some(hit.id));
        }

        let mut folder = ElementModel::new_folder(folder_name);
        folder.org_id = self.cfg.org_id;
        // Stamp the configured folder uid if one was given.
        folder.uid = self.cfg.folder_uid.clone();

        let saved = self
            .store
            .save_provisioned_folder(SaveElementCommand {
                element: folder,
                org_id: self.cfg.org_id,
                overwrite: true,
                updated_at: Utc::now(),
            })
            .await
            .map_err(Error::store)?;

        Ok(Some(saved.id))
    }
}

/// Reduce a folder title to its lookup slug: lowercase alphanumerics with
/// runs of anything else collapsed to single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("General", "general")]
    #[case("Team Dashboards", "team-dashboards")]
    #[case("ops / prod", "ops-prod")]
    #[case("  padded  ", "padded")]
    #[case("Ünïcode Títle", "ünïcode-títle")]
    #[case("", "")]
    fn slugs(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(slugify(title), expected);
    }
}
