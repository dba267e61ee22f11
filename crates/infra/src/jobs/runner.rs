//! One guarded execution of a cleanup task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

use tribute_core::TaskCode;

use crate::ledger::IdempotencyGuard;
use crate::locks::LockCoordinator;

use super::types::{JobBody, JobContext, RunOutcome};

/// Runs a job body under its advisory lock and idempotency check.
///
/// Order per invocation: acquire the lock, consult the ledger, run the body,
/// release the lock. The lock is released on every path that acquired it.
/// Errors are logged and folded into [`RunOutcome`]; nothing propagates.
#[derive(Clone)]
pub struct JobRunner {
    locks: Arc<dyn LockCoordinator>,
    guard: IdempotencyGuard,
}

impl JobRunner {
    pub fn new(locks: Arc<dyn LockCoordinator>, guard: IdempotencyGuard) -> Self {
        Self { locks, guard }
    }

    pub async fn run(&self, task: TaskCode, body: &dyn JobBody) -> RunOutcome {
        self.run_at(task, body, Utc::now()).await
    }

    /// Run `task` as if triggered at `now`.
    #[instrument(skip(self, body, now), fields(job = task.job_name(), lock_id = task.lock_id()))]
    pub async fn run_at(&self, task: TaskCode, body: &dyn JobBody, now: DateTime<Utc>) -> RunOutcome {
        let handle = match self.locks.try_acquire(task).await {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                info!("lock held by another instance; skipping");
                return RunOutcome::LockDenied;
            }
            Err(e) => {
                error!(error = %e, "could not reach lock store; skipping this cycle");
                return RunOutcome::failed(e);
            }
        };

        let outcome = self.run_locked(task, body, now).await;

        if let Err(e) = handle.release().await {
            warn!(error = %e, "failed to release lock cleanly");
        }
        outcome
    }

    async fn run_locked(&self, task: TaskCode, body: &dyn JobBody, now: DateTime<Utc>) -> RunOutcome {
        match self.guard.should_run(task.job_name(), task.frequency(), now).await {
            Ok(true) => {}
            Ok(false) => return RunOutcome::AlreadyRan,
            Err(e) => {
                error!(error = %e, "idempotency check failed");
                return RunOutcome::failed(e);
            }
        }

        info!("cleanup job started");
        let ctx = JobContext { task, now };
        match body.run(&ctx).await {
            Ok(outcome) if outcome.is_clean() => {
                info!(
                    rows = outcome.rows_affected,
                    assets_deleted = outcome.assets_deleted,
                    "cleanup job finished"
                );
                RunOutcome::Succeeded(outcome)
            }
            Ok(outcome) => {
                warn!(
                    rows = outcome.rows_affected,
                    assets_deleted = outcome.assets_deleted,
                    asset_failures = outcome.asset_failures,
                    record_failures = outcome.record_failures,
                    "cleanup job finished with skipped records"
                );
                RunOutcome::Succeeded(outcome)
            }
            Err(e) => {
                error!(error = %e, "cleanup job failed");
                RunOutcome::failed(e)
            }
        }
    }
}

impl core::fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JobRunner")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
