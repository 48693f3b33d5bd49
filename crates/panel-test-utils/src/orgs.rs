//! Org lookup fixture

use async_trait::async_trait;
use panel_config::OrgLookup;

/// Org lookup backed by a fixed id list.
pub struct StaticOrgs(Vec<i64>);

impl StaticOrgs {
    pub fn new(org_ids: impl Into<Vec<i64>>) -> Self {
        Self(org_ids.into())
    }

    /// A lookup where the common test orgs 1..=4 exist.
    pub fn default_orgs() -> Self {
        Self::new([1, 2, 3, 4])
    }
}

#[async_trait]
impl OrgLookup for StaticOrgs {
    async fn org_exists(
        &self,
        org_id: i64,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.contains(&org_id))
    }
}
