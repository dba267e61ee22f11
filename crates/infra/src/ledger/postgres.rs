//! Postgres-backed idempotency ledger.
//!
//! Table layout:
//!
//! | column | type | |
//! |--------|------|---|
//! | `job_name` | text | PK part 1 |
//! | `run_key` | text | PK part 2 |
//! | `run_at` | timestamptz | insert time |
//!
//! Inserts use `ON CONFLICT DO NOTHING`, so instances racing on one window
//! never see an error; the affected row count tells each caller whether it won.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use super::{JobRunRecord, LedgerError, RunLedger};
use crate::db::describe_sqlx_error;

#[derive(Debug, Clone)]
pub struct PostgresRunLedger {
    pool: PgPool,
}

impl PostgresRunLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage(operation: &str, err: sqlx::Error) -> LedgerError {
    LedgerError::Storage(describe_sqlx_error(operation, &err))
}

#[async_trait::async_trait]
impl RunLedger for PostgresRunLedger {
    async fn ensure_schema(&self) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cleanup_job_runs (
                job_name TEXT NOT NULL,
                run_key TEXT NOT NULL,
                run_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (job_name, run_key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| storage("ensure_schema", e))?;

        debug!("cleanup_job_runs table ready");
        Ok(())
    }

    #[instrument(skip(self), fields(job = %record.job_name, run_key = %record.run_key), err)]
    async fn record_run(&self, record: &JobRunRecord) -> Result<bool, LedgerError> {
        let result = sqlx::query(
            r#"
            INSERT INTO cleanup_job_runs (job_name, run_key, run_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (job_name, run_key) DO NOTHING
            "#,
        )
        .bind(&record.job_name)
        .bind(&record.run_key)
        .bind(record.run_at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage("record_run", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM cleanup_job_runs WHERE run_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| storage("prune_before", e))?;

        Ok(result.rows_affected())
    }
}
