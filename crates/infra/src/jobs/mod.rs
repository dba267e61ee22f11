//! Recurring cleanup jobs.
//!
//! ## Components
//!
//! - `JobBody`: the cleanup work of one task
//! - `JobRunner`: lock, idempotency check, body, release
//! - `CleanupJobs`: task registry shared by the scheduler and manual triggers
//! - `CleanupScheduler`: cron loops, one per task

pub mod cleanup;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod types;

pub use cleanup::{PruneJobRuns, PurgeStaleCondolences, PurgeStaleMemories, ReleaseExpiredReservations};
pub use registry::CleanupJobs;
pub use runner::JobRunner;
pub use scheduler::{CleanupScheduler, SchedulerHandle, next_fire};
pub use types::{JobBody, JobContext, JobError, RunOutcome};
