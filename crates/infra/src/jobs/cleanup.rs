//! The cleanup job bodies.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use tribute_core::CleanupOutcome;

use crate::assets::ObjectStore;
use crate::content::ContentStore;
use crate::ledger::RunLedger;

use super::types::{JobBody, JobContext, JobError};

/// Clears premium slugs reserved by memorials that stayed unpublished for
/// longer than the threshold (24 hours by default).
pub struct ReleaseExpiredReservations {
    store: Arc<dyn ContentStore>,
    threshold: Duration,
}

impl ReleaseExpiredReservations {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            threshold: Duration::hours(24),
        }
    }

    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }
}

#[async_trait::async_trait]
impl JobBody for ReleaseExpiredReservations {
    async fn run(&self, ctx: &JobContext) -> Result<CleanupOutcome, JobError> {
        let cutoff = ctx.now - self.threshold;
        let released = self.store.release_stale_reservations(cutoff).await?;
        Ok(CleanupOutcome::rows(released))
    }
}

/// Deletes unpublished memories inactive beyond the threshold (15 days by
/// default), removing each one's stored asset before its row.
///
/// Records are processed one by one. An asset that fails to delete is logged
/// and counted; its row is still removed. A row that fails to delete is
/// logged and counted and the batch moves on. Row deletes re-check
/// staleness, so a memory published or edited mid-batch is kept.
pub struct PurgeStaleMemories {
    store: Arc<dyn ContentStore>,
    assets: Arc<dyn ObjectStore>,
    threshold: Duration,
}

impl PurgeStaleMemories {
    pub fn new(store: Arc<dyn ContentStore>, assets: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            assets,
            threshold: Duration::days(15),
        }
    }

    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }
}

#[async_trait::async_trait]
impl JobBody for PurgeStaleMemories {
    async fn run(&self, ctx: &JobContext) -> Result<CleanupOutcome, JobError> {
        let cutoff = ctx.now - self.threshold;
        let stale = self.store.stale_memories(cutoff).await?;
        let mut outcome = CleanupOutcome::default();

        for memory in stale {
            if let Some(path) = memory.asset_path.as_deref().filter(|p| !p.is_empty()) {
                match self.assets.delete(path).await {
                    Ok(()) => outcome.assets_deleted += 1,
                    Err(e) => {
                        outcome.asset_failures += 1;
                        warn!(memory_id = %memory.id, path, error = %e, "failed to delete memory asset");
                    }
                }
            }

            match self.store.delete_memory(memory.id, cutoff).await {
                Ok(true) => outcome.rows_affected += 1,
                Ok(false) => debug!(memory_id = %memory.id, "memory gone or no longer stale; kept"),
                Err(e) => {
                    outcome.record_failures += 1;
                    warn!(memory_id = %memory.id, error = %e, "failed to delete memory");
                }
            }
        }

        Ok(outcome)
    }
}

/// Deletes unpublished condolences inactive beyond the threshold (15 days by
/// default).
pub struct PurgeStaleCondolences {
    store: Arc<dyn ContentStore>,
    threshold: Duration,
}

impl PurgeStaleCondolences {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            threshold: Duration::days(15),
        }
    }

    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }
}

#[async_trait::async_trait]
impl JobBody for PurgeStaleCondolences {
    async fn run(&self, ctx: &JobContext) -> Result<CleanupOutcome, JobError> {
        let cutoff = ctx.now - self.threshold;
        let deleted = self.store.delete_stale_condolences(cutoff).await?;
        Ok(CleanupOutcome::rows(deleted))
    }
}

/// Removes idempotency ledger rows older than the retention window.
pub struct PruneJobRuns {
    ledger: Arc<dyn RunLedger>,
    retention: Duration,
}

impl PruneJobRuns {
    pub fn new(ledger: Arc<dyn RunLedger>, retention_days: u32) -> Self {
        Self {
            ledger,
            retention: Duration::days(i64::from(retention_days.max(1))),
        }
    }
}

#[async_trait::async_trait]
impl JobBody for PruneJobRuns {
    async fn run(&self, ctx: &JobContext) -> Result<CleanupOutcome, JobError> {
        let pruned = self.ledger.prune_before(ctx.now - self.retention).await?;
        Ok(CleanupOutcome::rows(pruned))
    }
}
