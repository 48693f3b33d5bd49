//! Per-scan outcome aggregation
//!
//! Every file and every stale ref touched during a scan yields exactly one
//! outcome record, so partial-failure behavior can be asserted on directly
//! instead of parsed out of logs.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// What the engine decided to do about one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanAction {
    /// First-time provisioning; the store assigned a fresh id.
    Created,
    /// Content changed; the existing element was overwritten.
    Updated,
    /// Stored checksum matches the file; nothing written.
    UpToDate,
    /// A write was due but write access is restricted.
    SkippedWriteRestricted,
    /// Ref without a file; element hard-deleted.
    Deleted,
    /// Ref without a file; provisioning detached, element kept.
    Unprovisioned,
    /// Per-item failure; the item's previous state is untouched.
    Failed { reason: String },
}

/// One path's outcome within a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub path: String,
    pub action: ScanAction,
}

/// Everything one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub outcomes: Vec<ScanOutcome>,
}

impl ScanReport {
    pub fn record(&mut self, path: impl AsRef<Path>, action: ScanAction) {
        self.outcomes.push(ScanOutcome {
            path: path.as_ref().to_string_lossy().into_owned(),
            action,
        });
    }

    /// Outcomes that wrote to the store.
    pub fn writes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.action,
                    ScanAction::Created
                        | ScanAction::Updated
                        | ScanAction::Deleted
                        | ScanAction::Unprovisioned
                )
            })
            .count()
    }

    /// Outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ScanOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.action, ScanAction::Failed { .. }))
    }

    /// The action recorded for a path, if any.
    pub fn action_for(&self, path: impl AsRef<Path>) -> Option<&ScanAction> {
        let path = path.as_ref().to_string_lossy();
        self.outcomes
            .iter()
            .find(|o| o.path == path)
            .map(|o| &o.action)
    }
}
