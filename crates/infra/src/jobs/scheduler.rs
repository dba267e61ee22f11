//! Cron-driven scheduler.
//!
//! Every instance runs the same scheduler; the advisory lock and the ledger
//! make sure a given window is processed by one instance only. Each task gets
//! its own loop so a slow job never delays another.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tribute_core::TaskCode;

use crate::config::{CleanupConfig, JobSchedule};

use super::registry::CleanupJobs;

/// Next firing of `schedule` strictly after `after`, evaluated in `zone`.
pub fn next_fire(schedule: &Schedule, zone: Tz, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule
        .after(&after.with_timezone(&zone))
        .next()
        .map(|t| t.with_timezone(&Utc))
}

/// Handle to stop the scheduler loops.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signal every loop to stop and wait for them.
    ///
    /// A job already running finishes first; no new run starts afterwards.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for join in self.joins {
            if let Err(e) = join.await {
                warn!(error = %e, "scheduler loop ended abnormally");
            }
        }
    }
}

#[derive(Debug)]
pub struct CleanupScheduler {
    jobs: CleanupJobs,
    zone: Tz,
    schedules: Vec<JobSchedule>,
}

impl CleanupScheduler {
    pub fn new(jobs: CleanupJobs, zone: Tz) -> Self {
        Self {
            jobs,
            zone,
            schedules: Vec::new(),
        }
    }

    pub fn from_config(jobs: CleanupJobs, config: &CleanupConfig) -> Self {
        config
            .schedules
            .values()
            .cloned()
            .fold(Self::new(jobs, config.timezone), Self::with_schedule)
    }

    pub fn with_schedule(mut self, schedule: JobSchedule) -> Self {
        self.schedules.retain(|s| s.task != schedule.task);
        self.schedules.push(schedule);
        self
    }

    /// Start one loop per scheduled task that has a registered body.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut joins = Vec::new();

        for schedule in self.schedules {
            if !self.jobs.is_registered(schedule.task) {
                warn!(job = schedule.task.job_name(), "schedule without job body; ignoring");
                continue;
            }
            info!(
                job = schedule.task.job_name(),
                cron = %schedule.expression,
                zone = %self.zone,
                "scheduling cleanup job"
            );
            joins.push(tokio::spawn(schedule_loop(
                self.jobs.clone(),
                schedule.task,
                schedule.schedule,
                self.zone,
                shutdown_rx.clone(),
            )));
        }

        SchedulerHandle {
            shutdown: shutdown_tx,
            joins,
        }
    }
}

async fn schedule_loop(
    jobs: CleanupJobs,
    task: TaskCode,
    schedule: Schedule,
    zone: Tz,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let Some(fire_at) = next_fire(&schedule, zone, Utc::now()) else {
            warn!(job = task.job_name(), "cron schedule has no upcoming firing; stopping loop");
            break;
        };
        let wait = (fire_at - Utc::now()).to_std().unwrap_or_default();
        debug!(job = task.job_name(), next = %fire_at, "waiting for next firing");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        // The outcome is logged by the runner.
        jobs.trigger_at(task, fire_at).await;
    }
    debug!(job = task.job_name(), "scheduler loop stopped");
}
