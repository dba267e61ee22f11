use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use tribute_infra::assets::{InMemoryObjectStore, LocalObjectStore, ObjectStore};
use tribute_infra::config::CleanupConfig;
use tribute_infra::content::{ContentStore, InMemoryContentStore, PostgresContentStore};
use tribute_infra::db;
use tribute_infra::jobs::{CleanupJobs, JobRunner};
use tribute_infra::ledger::{IdempotencyGuard, InMemoryRunLedger, PostgresRunLedger, RunLedger};
use tribute_infra::locks::{InMemoryLockCoordinator, LockCoordinator, PostgresLockCoordinator};

/// In-memory wiring with handles on every store, for dev runs and tests.
#[derive(Debug, Clone)]
pub struct InMemoryServices {
    pub jobs: Arc<CleanupJobs>,
    pub locks: InMemoryLockCoordinator,
    pub ledger: InMemoryRunLedger,
    pub content: InMemoryContentStore,
    pub assets: InMemoryObjectStore,
}

pub fn build_in_memory_services(config: &CleanupConfig) -> InMemoryServices {
    let locks = InMemoryLockCoordinator::new();
    let ledger = InMemoryRunLedger::new();
    let content = InMemoryContentStore::new();
    let assets = InMemoryObjectStore::new();

    let jobs = wire_jobs(
        config,
        Arc::new(locks.clone()),
        Arc::new(ledger.clone()),
        Arc::new(content.clone()),
        Arc::new(assets.clone()),
    );

    InMemoryServices {
        jobs: Arc::new(jobs),
        locks,
        ledger,
        content,
        assets,
    }
}

/// Build the job registry from configuration.
///
/// Uses Postgres for locks, ledger and content when `DATABASE_URL` is set,
/// and in-memory stores otherwise. The ledger table is created if absent.
pub async fn build_services(config: &CleanupConfig) -> anyhow::Result<Arc<CleanupJobs>> {
    let assets: Arc<dyn ObjectStore> = match &config.asset_root {
        Some(root) => {
            info!(root = %root.display(), "using local asset store");
            Arc::new(LocalObjectStore::new(root))
        }
        None => {
            warn!("ASSET_ROOT not set; using in-memory asset store");
            Arc::new(InMemoryObjectStore::new())
        }
    };

    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set; running on in-memory stores");
        let jobs = wire_jobs(
            config,
            Arc::new(InMemoryLockCoordinator::new()),
            Arc::new(InMemoryRunLedger::new()),
            Arc::new(InMemoryContentStore::new()),
            assets,
        );
        return Ok(Arc::new(jobs));
    };

    let pool = db::connect(database_url, config.database_max_connections)
        .await
        .context("failed to connect to Postgres")?;

    let ledger = PostgresRunLedger::new(pool.clone());
    ledger
        .ensure_schema()
        .await
        .context("failed to create cleanup_job_runs table")?;

    let jobs = wire_jobs(
        config,
        Arc::new(PostgresLockCoordinator::new(pool.clone())),
        Arc::new(ledger),
        Arc::new(PostgresContentStore::new(pool)),
        assets,
    );
    Ok(Arc::new(jobs))
}

fn wire_jobs(
    config: &CleanupConfig,
    locks: Arc<dyn LockCoordinator>,
    ledger: Arc<dyn RunLedger>,
    content: Arc<dyn ContentStore>,
    assets: Arc<dyn ObjectStore>,
) -> CleanupJobs {
    let gate = config.production_gate();
    info!(production = gate.is_production(), zone = %config.timezone, "wiring cleanup jobs");

    let guard = IdempotencyGuard::new(gate, ledger.clone(), config.timezone);
    CleanupJobs::standard(
        JobRunner::new(locks, guard),
        content,
        assets,
        ledger,
        config.ledger_retention_days,
    )
}
