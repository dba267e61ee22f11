//! Task registry: maps every [`TaskCode`] to its job body.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::error;

use tribute_core::TaskCode;

use crate::assets::ObjectStore;
use crate::content::ContentStore;
use crate::ledger::RunLedger;

use super::cleanup::{PruneJobRuns, PurgeStaleCondolences, PurgeStaleMemories, ReleaseExpiredReservations};
use super::runner::JobRunner;
use super::types::{JobBody, JobError, RunOutcome};

/// The set of runnable cleanup tasks, shared by the scheduler and the manual
/// trigger endpoints.
#[derive(Clone)]
pub struct CleanupJobs {
    runner: Arc<JobRunner>,
    bodies: HashMap<TaskCode, Arc<dyn JobBody>>,
}

impl CleanupJobs {
    pub fn new(runner: JobRunner) -> Self {
        Self {
            runner: Arc::new(runner),
            bodies: HashMap::new(),
        }
    }

    /// Register the standard bodies for every task.
    pub fn standard(
        runner: JobRunner,
        content: Arc<dyn ContentStore>,
        assets: Arc<dyn ObjectStore>,
        ledger: Arc<dyn RunLedger>,
        ledger_retention_days: u32,
    ) -> Self {
        Self::new(runner)
            .with_body(
                TaskCode::ReleaseReservedUrls,
                ReleaseExpiredReservations::new(content.clone()),
            )
            .with_body(
                TaskCode::PurgeMemories,
                PurgeStaleMemories::new(content.clone(), assets),
            )
            .with_body(TaskCode::PurgeCondolences, PurgeStaleCondolences::new(content))
            .with_body(
                TaskCode::PruneJobRuns,
                PruneJobRuns::new(ledger, ledger_retention_days),
            )
    }

    pub fn with_body(mut self, task: TaskCode, body: impl JobBody + 'static) -> Self {
        self.bodies.insert(task, Arc::new(body));
        self
    }

    pub fn is_registered(&self, task: TaskCode) -> bool {
        self.bodies.contains_key(&task)
    }

    pub fn tasks(&self) -> Vec<TaskCode> {
        TaskCode::ALL
            .into_iter()
            .filter(|t| self.bodies.contains_key(t))
            .collect()
    }

    /// Run `task` now on its own tokio task and wait for the outcome.
    ///
    /// A panic inside the body is contained to that tokio task and reported
    /// as [`RunOutcome::Failed`].
    pub async fn trigger(&self, task: TaskCode) -> RunOutcome {
        self.trigger_at(task, Utc::now()).await
    }

    pub async fn trigger_at(&self, task: TaskCode, now: DateTime<Utc>) -> RunOutcome {
        let Some(body) = self.bodies.get(&task).cloned() else {
            error!(job = task.job_name(), "no job body registered");
            return RunOutcome::failed(JobError::NotRegistered(task));
        };
        let runner = self.runner.clone();

        let join = tokio::spawn(async move { runner.run_at(task, body.as_ref(), now).await });
        match join.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                error!(job = task.job_name(), panic = %message, "cleanup job panicked");
                RunOutcome::failed(JobError::Panicked(message))
            }
            Err(e) => {
                error!(job = task.job_name(), error = %e, "cleanup job was cancelled");
                RunOutcome::failed(e)
            }
        }
    }
}

impl core::fmt::Debug for CleanupJobs {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CleanupJobs")
            .field("runner", &self.runner)
            .field("tasks", &self.tasks())
            .finish()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
