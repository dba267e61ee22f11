//! Core job types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use tribute_core::{CleanupOutcome, TaskCode};

use crate::assets::AssetError;
use crate::content::StoreError;
use crate::ledger::LedgerError;
use crate::locks::LockError;

/// Failure of a job body or of the runner around it.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("no job body registered for {0}")]
    NotRegistered(TaskCode),

    #[error("job panicked: {0}")]
    Panicked(String),
}

/// Inputs available to a job body for one run.
#[derive(Debug, Clone, Copy)]
pub struct JobContext {
    pub task: TaskCode,
    /// Reference instant; thresholds are measured back from here.
    pub now: DateTime<Utc>,
}

/// The work a cleanup task performs once it holds its lock and passed the
/// idempotency check.
#[async_trait::async_trait]
pub trait JobBody: Send + Sync {
    async fn run(&self, ctx: &JobContext) -> Result<CleanupOutcome, JobError>;
}

/// How a single invocation of a task ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Another holder had the lock; nothing was done.
    LockDenied,
    /// The ledger already had a row for this window.
    AlreadyRan,
    /// The body ran to completion.
    Succeeded(CleanupOutcome),
    /// The body, the ledger or the lock store failed.
    Failed { error: String },
}

impl RunOutcome {
    pub fn failed(error: impl ToString) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded(_))
    }
}
