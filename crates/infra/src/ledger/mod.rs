//! Idempotency ledger for scheduled jobs.
//!
//! The ledger records "job X ran for window Y". Rows are append-only and keyed
//! by `(job_name, run_key)`; the primary key, not application logic, decides
//! which of several racing instances owns a window.
//!
//! ## Components
//!
//! - `RunLedger`: storage boundary (in-memory or Postgres)
//! - `IdempotencyGuard`: production gate + run key + insert-if-absent

pub mod guard;
pub mod in_memory;
pub mod postgres;

pub use guard::IdempotencyGuard;
pub use in_memory::InMemoryRunLedger;
pub use postgres::PostgresRunLedger;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tribute_core::RunKey;

/// Persisted ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRunRecord {
    pub job_name: String,
    pub run_key: String,
    pub run_at: DateTime<Utc>,
}

impl JobRunRecord {
    pub fn new(job_name: impl Into<String>, run_key: RunKey, run_at: DateTime<Utc>) -> Self {
        Self {
            job_name: job_name.into(),
            run_key: run_key.into_string(),
            run_at,
        }
    }
}

/// Ledger storage error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger storage error: {0}")]
    Storage(String),
}

/// Append-only store of job runs.
#[async_trait::async_trait]
pub trait RunLedger: Send + Sync {
    /// Create the backing table if it does not exist.
    async fn ensure_schema(&self) -> Result<(), LedgerError>;

    /// Insert the record unless a row with the same `(job_name, run_key)`
    /// exists. Returns `true` iff this call created the row.
    ///
    /// Concurrent callers racing on the same key never error; exactly one
    /// observes `true`.
    async fn record_run(&self, record: &JobRunRecord) -> Result<bool, LedgerError>;

    /// Delete rows whose `run_at` is older than `cutoff`. Returns the number of
    /// rows removed.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, LedgerError>;
}
