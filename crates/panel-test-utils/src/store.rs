//! In-memory element store
//!
//! Behaves like the real storage service as far as the engine can tell:
//! ids are assigned on insert, provisioning refs are upserted per
//! (source, path), deletes drop both the element and its ref, and
//! unprovision drops the ref only. Every mutating call is counted so tests
//! can assert "zero writes" directly.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use panel_core::folder::slugify;
use panel_core::{
    ElementStore, ProvisionInfo, ProvisionedElementRef, SaveElementCommand, SavedElement,
    StoreResult,
};

/// One element as the store holds it.
#[derive(Debug, Clone)]
pub struct StoredElement {
    pub id: i64,
    pub uid: String,
    pub title: String,
    pub org_id: i64,
    pub folder_id: i64,
    pub is_folder: bool,
    pub data: serde_json::Value,
}

#[derive(Debug, Default)]
struct Inner {
    elements: HashMap<i64, StoredElement>,
    refs: Vec<ProvisionedElementRef>,
    next_id: i64,
    save_calls: u32,
    folder_save_calls: u32,
    delete_calls: u32,
    unprovision_calls: u32,
    fail_saves: bool,
}

/// In-memory [`ElementStore`] with call counters.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent element save fail, for partial-failure tests.
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    pub fn save_calls(&self) -> u32 {
        self.lock().save_calls
    }

    pub fn folder_save_calls(&self) -> u32 {
        self.lock().folder_save_calls
    }

    pub fn delete_calls(&self) -> u32 {
        self.lock().delete_calls
    }

    pub fn unprovision_calls(&self) -> u32 {
        self.lock().unprovision_calls
    }

    /// Total mutating calls issued so far.
    pub fn write_calls(&self) -> u32 {
        let inner = self.lock();
        inner.save_calls + inner.folder_save_calls + inner.delete_calls + inner.unprovision_calls
    }

    pub fn refs(&self) -> Vec<ProvisionedElementRef> {
        self.lock().refs.clone()
    }

    pub fn elements(&self) -> Vec<StoredElement> {
        let mut elements: Vec<_> = self.lock().elements.values().cloned().collect();
        elements.sort_by_key(|e| e.id);
        elements
    }

    pub fn element(&self, id: i64) -> Option<StoredElement> {
        self.lock().elements.get(&id).cloned()
    }

    /// Seed a folder as if some earlier run had created it.
    pub fn seed_folder(&self, title: &str, org_id: i64) -> i64 {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.elements.insert(
            id,
            StoredElement {
                id,
                uid: String::new(),
                title: title.to_string(),
                org_id,
                folder_id: 0,
                is_folder: true,
                data: serde_json::json!({ "title": title }),
            },
        );
        id
    }

    /// Seed a leaf element, for misconfiguration tests where a folder name
    /// collides with a plain element.
    pub fn seed_element(&self, title: &str, org_id: i64) -> i64 {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.elements.insert(
            id,
            StoredElement {
                id,
                uid: String::new(),
                title: title.to_string(),
                org_id,
                folder_id: 0,
                is_folder: false,
                data: serde_json::json!({ "title": title }),
            },
        );
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ElementStore for MemoryStore {
    async fn provisioned_elements(
        &self,
        source_name: &str,
    ) -> StoreResult<Vec<ProvisionedElementRef>> {
        Ok(self
            .lock()
            .refs
            .iter()
            .filter(|r| r.name == source_name)
            .cloned()
            .collect())
    }

    async fn save_provisioned_element(
        &self,
        command: SaveElementCommand,
        info: ProvisionInfo,
    ) -> StoreResult<SavedElement> {
        let mut inner = self.lock();
        inner.save_calls += 1;
        if inner.fail_saves {
            return Err("save rejected by test store".into());
        }

        let id = if command.element.id != 0 {
            command.element.id
        } else {
            inner.next_id += 1;
            inner.next_id
        };

        inner.elements.insert(
            id,
            StoredElement {
                id,
                uid: command.element.uid.clone(),
                title: command.element.title.clone(),
                org_id: command.org_id,
                folder_id: command.element.folder_id,
                is_folder: false,
                data: command.element.data.clone(),
            },
        );

        inner
            .refs
            .retain(|r| !(r.name == info.name && r.external_id == info.external_id));
        inner.refs.push(ProvisionedElementRef {
            external_id: info.external_id,
            name: info.name,
            updated: info.updated,
            checksum: info.checksum,
            element_id: id,
        });

        Ok(SavedElement {
            id,
            uid: command.element.uid,
            title: command.element.title,
            is_folder: false,
        })
    }

    async fn delete_provisioned_element(&self, element_id: i64, org_id: i64) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.delete_calls += 1;

        match inner.elements.get(&element_id) {
            Some(element) if element.org_id == org_id => {}
            _ => return Err(format!("element {element_id} not found in org {org_id}").into()),
        }

        inner.elements.remove(&element_id);
        inner.refs.retain(|r| r.element_id != element_id);
        Ok(())
    }

    async fn unprovision_element(&self, element_id: i64) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.unprovision_calls += 1;
        inner.refs.retain(|r| r.element_id != element_id);
        Ok(())
    }

    async fn find_element_by_slug(
        &self,
        slug: &str,
        org_id: i64,
    ) -> StoreResult<Option<SavedElement>> {
        Ok(self
            .lock()
            .elements
            .values()
            .find(|e| e.org_id == org_id && slugify(&e.title) == slug)
            .map(|e| SavedElement {
                id: e.id,
                uid: e.uid.clone(),
                title: e.title.clone(),
                is_folder: e.is_folder,
            }))
    }

    async fn save_provisioned_folder(
        &self,
        command: SaveElementCommand,
    ) -> StoreResult<SavedElement> {
        let mut inner = self.lock();
        inner.folder_save_calls += 1;
        inner.next_id += 1;
        let id = inner.next_id;

        inner.elements.insert(
            id,
            StoredElement {
                id,
                uid: command.element.uid.clone(),
                title: command.element.title.clone(),
                org_id: command.org_id,
                folder_id: 0,
                is_folder: true,
                data: command.element.data.clone(),
            },
        );

        Ok(SavedElement {
            id,
            uid: command.element.uid,
            title: command.element.title,
            is_folder: true,
        })
    }
}
