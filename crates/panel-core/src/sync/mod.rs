//! Disk-to-store reconciliation
//!
//! The [`SyncEngine`] diffs one source's directory tree against the
//! provisioning refs the store already holds and applies the difference.

mod engine;
mod report;

pub use engine::SyncEngine;
pub use report::{ScanAction, ScanOutcome, ScanReport};
