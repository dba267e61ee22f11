//! Cleanup task identities.
//!
//! Every maintenance job has a fixed integer identity that doubles as the
//! cross-instance lock key. Adding a task means adding a variant with a new,
//! unused lock id; existing ids must never be renumbered while older
//! instances may still be running.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Granularity of the idempotency window for a job.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// One run per clock hour.
    Hourly,
    /// One run per calendar day.
    Daily,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
        }
    }
}

impl core::fmt::Display for Frequency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of cleanup tasks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCode {
    /// Release premium slugs reserved by memorials that were never published.
    ReleaseReservedUrls,
    /// Purge stale unpublished memories and their stored assets.
    PurgeMemories,
    /// Purge stale unpublished condolences.
    PurgeCondolences,
    /// Prune idempotency ledger rows past the retention window.
    PruneJobRuns,
}

impl TaskCode {
    pub const ALL: [TaskCode; 4] = [
        TaskCode::ReleaseReservedUrls,
        TaskCode::PurgeMemories,
        TaskCode::PurgeCondolences,
        TaskCode::PruneJobRuns,
    ];

    /// Stable lock identity shared by every instance.
    pub fn lock_id(&self) -> i64 {
        match self {
            TaskCode::ReleaseReservedUrls => 1001,
            TaskCode::PurgeMemories => 1002,
            TaskCode::PurgeCondolences => 1003,
            TaskCode::PruneJobRuns => 1004,
        }
    }

    /// Name recorded in the idempotency ledger and used in logs.
    pub fn job_name(&self) -> &'static str {
        match self {
            TaskCode::ReleaseReservedUrls => "cleanup-reserved-urls",
            TaskCode::PurgeMemories => "cleanup-memories",
            TaskCode::PurgeCondolences => "cleanup-condolences",
            TaskCode::PruneJobRuns => "cleanup-job-runs",
        }
    }

    /// Short slug used by the manual trigger routes.
    pub fn slug(&self) -> &'static str {
        match self {
            TaskCode::ReleaseReservedUrls => "reserved-urls",
            TaskCode::PurgeMemories => "memories",
            TaskCode::PurgeCondolences => "condolences",
            TaskCode::PruneJobRuns => "job-runs",
        }
    }

    pub fn frequency(&self) -> Frequency {
        match self {
            TaskCode::ReleaseReservedUrls => Frequency::Hourly,
            TaskCode::PurgeMemories | TaskCode::PurgeCondolences | TaskCode::PruneJobRuns => {
                Frequency::Daily
            }
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.slug() == slug)
    }
}

impl core::fmt::Display for TaskCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.job_name())
    }
}

impl FromStr for TaskCode {
    type Err = DomainError;

    /// Accepts either the ledger job name or the route slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.job_name() == s || t.slug() == s)
            .ok_or_else(|| DomainError::unknown_task(s))
    }
}
