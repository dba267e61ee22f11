//! In-memory result of a cleanup job body.

use serde::Serialize;

/// Counters reported by a cleanup job, used for logging only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupOutcome {
    /// Rows updated or deleted in the relational store.
    pub rows_affected: u64,
    /// Assets removed from the object store.
    pub assets_deleted: u64,
    /// Asset deletions that failed and were skipped.
    pub asset_failures: u64,
    /// Row deletions that failed and were skipped.
    pub record_failures: u64,
}

impl CleanupOutcome {
    pub fn rows(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Default::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.asset_failures == 0 && self.record_failures == 0
    }
}
