use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use super::{JobRunRecord, LedgerError, RunLedger};

/// In-memory ledger for tests/dev.
///
/// Clones share the same rows, so a clone stands in for a restarted process
/// reading the same durable table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunLedger {
    rows: Arc<RwLock<HashMap<(String, String), DateTime<Utc>>>>,
}

impl InMemoryRunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, job_name: &str, run_key: &str) -> bool {
        self.rows
            .read()
            .map(|rows| rows.contains_key(&(job_name.to_string(), run_key.to_string())))
            .unwrap_or(false)
    }
}

fn poisoned() -> LedgerError {
    LedgerError::Storage("ledger table poisoned".to_string())
}

#[async_trait::async_trait]
impl RunLedger for InMemoryRunLedger {
    async fn ensure_schema(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    async fn record_run(&self, record: &JobRunRecord) -> Result<bool, LedgerError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        match rows.entry((record.job_name.clone(), record.run_key.clone())) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(record.run_at);
                Ok(true)
            }
        }
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, LedgerError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let before = rows.len();
        rows.retain(|_, run_at| *run_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}
