//! Storage seam for provisioned elements
//!
//! The engine drives an opaque backing store through this trait; its schema
//! and transport are none of this crate's business. Implementations are
//! expected to be shared across engines as `Arc<dyn ElementStore>`.

use async_trait::async_trait;

use crate::element::{ProvisionInfo, ProvisionedElementRef, SaveElementCommand, SavedElement};

/// Error type produced by store implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// CRUD surface the reconciliation engine needs from the backing store.
#[async_trait]
pub trait ElementStore: Send + Sync {
    /// All provisioning refs recorded for one source.
    async fn provisioned_elements(
        &self,
        source_name: &str,
    ) -> StoreResult<Vec<ProvisionedElementRef>>;

    /// Persist an element together with its provisioning metadata. An
    /// element with a nonzero id is updated in place; id zero inserts.
    async fn save_provisioned_element(
        &self,
        command: SaveElementCommand,
        info: ProvisionInfo,
    ) -> StoreResult<SavedElement>;

    /// Hard-delete a provisioned element and its provisioning ref.
    async fn delete_provisioned_element(&self, element_id: i64, org_id: i64) -> StoreResult<()>;

    /// Drop the provisioning ref only, leaving the element behind as an
    /// ordinary unprovisioned record.
    async fn unprovision_element(&self, element_id: i64) -> StoreResult<()>;

    /// Look up an element by slugified title within an organization.
    async fn find_element_by_slug(
        &self,
        slug: &str,
        org_id: i64,
    ) -> StoreResult<Option<SavedElement>>;

    /// Persist a folder element created on behalf of a source.
    async fn save_provisioned_folder(
        &self,
        command: SaveElementCommand,
    ) -> StoreResult<SavedElement>;
}
