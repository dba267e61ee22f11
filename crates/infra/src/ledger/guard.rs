//! Exactly-once-per-window gate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::info;

use tribute_core::{Frequency, ProductionGate, RunKey};

use super::{JobRunRecord, LedgerError, RunLedger};

/// Decides whether a job may run for the current window.
///
/// The advisory lock prevents *concurrent* runs; this guard prevents
/// *repeated* runs within one window, e.g. after a quick run and a restart.
/// It must only be consulted while the job's lock is held.
#[derive(Clone)]
pub struct IdempotencyGuard {
    gate: ProductionGate,
    ledger: Arc<dyn RunLedger>,
    zone: Tz,
}

impl IdempotencyGuard {
    pub fn new(gate: ProductionGate, ledger: Arc<dyn RunLedger>, zone: Tz) -> Self {
        Self { gate, ledger, zone }
    }

    /// Returns `true` when the job should run for the window containing
    /// `reference`.
    ///
    /// Outside production this is always `true` and the ledger is not touched.
    pub async fn should_run(
        &self,
        job_name: &str,
        frequency: Frequency,
        reference: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        if !self.gate.is_production() {
            return Ok(true);
        }

        let run_key = RunKey::for_window(frequency, reference, self.zone);
        let record = JobRunRecord::new(job_name, run_key, Utc::now());
        let inserted = self.ledger.record_run(&record).await?;

        if !inserted {
            info!(
                job = job_name,
                run_key = %record.run_key,
                "skipping job; it already ran for this window"
            );
        }
        Ok(inserted)
    }
}

impl core::fmt::Debug for IdempotencyGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdempotencyGuard")
            .field("gate", &self.gate)
            .field("zone", &self.zone)
            .finish_non_exhaustive()
    }
}
