//! Integration tests for the full cleanup pipeline.
//!
//! Tests: Registry → Runner → Lock → Ledger → Job body → Stores
//!
//! The Postgres tests only run when `TEST_DATABASE_URL` points at a
//! disposable database; otherwise they return early. Content tables are
//! created in a throwaway schema per test.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use chrono_tz::Tz;
    use uuid::Uuid;

    use tribute_core::{CleanupOutcome, ContentStatus, ProductionGate, RunKey, TaskCode};

    use crate::assets::InMemoryObjectStore;
    use crate::content::{
        ContentStore, InMemoryContentStore, PostgresContentStore, StoredMemorial, StoredMemory,
    };
    use crate::jobs::{
        CleanupJobs, JobBody, JobContext, JobRunner, PurgeStaleMemories, ReleaseExpiredReservations,
        RunOutcome,
    };
    use crate::ledger::{IdempotencyGuard, InMemoryRunLedger, JobRunRecord, PostgresRunLedger, RunLedger};
    use crate::locks::{InMemoryLockCoordinator, LockCoordinator, PostgresLockCoordinator};

    struct Instance {
        jobs: CleanupJobs,
    }

    /// One simulated service instance over shared stores.
    fn instance(
        gate: ProductionGate,
        locks: &InMemoryLockCoordinator,
        ledger: &InMemoryRunLedger,
        content: &InMemoryContentStore,
        assets: &InMemoryObjectStore,
    ) -> Instance {
        let ledger: Arc<dyn RunLedger> = Arc::new(ledger.clone());
        let guard = IdempotencyGuard::new(gate, ledger.clone(), Tz::UTC);
        let runner = JobRunner::new(Arc::new(locks.clone()), guard);
        Instance {
            jobs: CleanupJobs::standard(
                runner,
                Arc::new(content.clone()),
                Arc::new(assets.clone()),
                ledger,
                90,
            ),
        }
    }

    #[tokio::test]
    async fn reservation_release_clears_only_stale_slugs() {
        let locks = InMemoryLockCoordinator::new();
        let ledger = InMemoryRunLedger::new();
        let content = InMemoryContentStore::new();
        let assets = InMemoryObjectStore::new();
        let node = instance(ProductionGate::production(), &locks, &ledger, &content, &assets);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let ids: Vec<Uuid> = [Duration::hours(25), Duration::hours(72), Duration::hours(1)]
            .into_iter()
            .enumerate()
            .map(|(i, age)| {
                let id = Uuid::now_v7();
                content.insert_memorial(StoredMemorial {
                    id,
                    status: ContentStatus::Draft,
                    premium_slug: Some(format!("slug-{i}")),
                    updated_at: now - age,
                });
                id
            })
            .collect();

        let outcome = node.jobs.trigger_at(TaskCode::ReleaseReservedUrls, now).await;

        assert_eq!(outcome, RunOutcome::Succeeded(CleanupOutcome::rows(2)));
        assert_eq!(content.memorial(ids[0]).unwrap().premium_slug, None);
        assert_eq!(content.memorial(ids[1]).unwrap().premium_slug, None);
        assert_eq!(content.memorial(ids[2]).unwrap().premium_slug.as_deref(), Some("slug-2"));
        assert!(ledger.contains("cleanup-reserved-urls", "2024-06-01T12:00:00+00:00"));
    }

    #[tokio::test]
    async fn memory_purge_deletes_asset_then_rows() {
        let locks = InMemoryLockCoordinator::new();
        let ledger = InMemoryRunLedger::new();
        let content = InMemoryContentStore::new();
        let assets = InMemoryObjectStore::new();
        let node = instance(ProductionGate::development(), &locks, &ledger, &content, &assets);
        let now = Utc::now();

        for asset in [Some("memories/1.jpg"), None] {
            content.insert_memory(StoredMemory {
                id: Uuid::now_v7(),
                status: ContentStatus::Rejected,
                asset_path: asset.map(str::to_string),
                updated_at: now - Duration::days(40),
            });
        }
        assets.put("memories/1.jpg");

        let outcome = node.jobs.trigger(TaskCode::PurgeMemories).await;

        assert!(outcome.is_success());
        assert_eq!(assets.delete_calls(), vec!["memories/1.jpg".to_string()]);
        assert!(content.memory_ids().is_empty());
        assert!(ledger.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fleet_runs_a_daily_job_once_per_day() {
        let locks = InMemoryLockCoordinator::new();
        let ledger = InMemoryRunLedger::new();
        let content = InMemoryContentStore::new();
        let assets = InMemoryObjectStore::new();
        let fleet: Vec<Instance> = (0..4)
            .map(|_| instance(ProductionGate::production(), &locks, &ledger, &content, &assets))
            .collect();
        let fire = Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap();

        let mut runs = Vec::new();
        for node in &fleet {
            let jobs = node.jobs.clone();
            runs.push(tokio::spawn(async move {
                jobs.trigger_at(TaskCode::PurgeCondolences, fire).await
            }));
        }
        let mut succeeded = 0;
        for run in runs {
            match run.await.unwrap() {
                RunOutcome::Succeeded(_) => succeeded += 1,
                RunOutcome::LockDenied | RunOutcome::AlreadyRan => {}
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(ledger.len(), 1);

        // A restarted instance later the same day is still skipped.
        let late = fleet[0]
            .jobs
            .trigger_at(TaskCode::PurgeCondolences, fire + Duration::hours(10))
            .await;
        assert_eq!(late, RunOutcome::AlreadyRan);
        assert!(!locks.is_held(TaskCode::PurgeCondolences));
    }

    fn test_database_url() -> Option<String> {
        std::env::var("TEST_DATABASE_URL").ok().filter(|v| !v.is_empty())
    }

    #[tokio::test]
    async fn postgres_advisory_lock_is_exclusive_across_pools() {
        let Some(url) = test_database_url() else {
            return;
        };
        let pool_a = crate::db::connect(&url, 2).await.unwrap();
        let pool_b = crate::db::connect(&url, 2).await.unwrap();
        let a = PostgresLockCoordinator::new(pool_a);
        let b = PostgresLockCoordinator::new(pool_b);

        let held = a.try_acquire(TaskCode::PruneJobRuns).await.unwrap().unwrap();
        assert!(b.try_acquire(TaskCode::PruneJobRuns).await.unwrap().is_none());

        held.release().await.unwrap();
        let again = b.try_acquire(TaskCode::PruneJobRuns).await.unwrap().unwrap();
        again.release().await.unwrap();
    }

    #[tokio::test]
    async fn postgres_ledger_accepts_one_row_per_window() {
        let Some(url) = test_database_url() else {
            return;
        };
        let pool = crate::db::connect(&url, 2).await.unwrap();
        let ledger = PostgresRunLedger::new(pool);
        ledger.ensure_schema().await.unwrap();

        let job = format!("test-{}", Uuid::now_v7());
        let now = Utc::now();
        let key = || RunKey::for_window(TaskCode::PurgeMemories.frequency(), now, Tz::UTC);

        assert!(ledger.record_run(&JobRunRecord::new(&job, key(), now)).await.unwrap());
        assert!(!ledger.record_run(&JobRunRecord::new(&job, key(), now)).await.unwrap());
    }

    #[tokio::test]
    async fn postgres_dropped_handle_frees_the_lock() {
        let Some(url) = test_database_url() else {
            return;
        };
        let a = PostgresLockCoordinator::new(crate::db::connect(&url, 2).await.unwrap());
        let b = PostgresLockCoordinator::new(crate::db::connect(&url, 2).await.unwrap());

        let held = a.try_acquire(TaskCode::PurgeCondolences).await.unwrap().unwrap();
        assert!(b.try_acquire(TaskCode::PurgeCondolences).await.unwrap().is_none());
        drop(held);

        // The session is closed in the background; poll until Postgres sees it.
        let mut acquired = None;
        for _ in 0..100 {
            acquired = b.try_acquire(TaskCode::PurgeCondolences).await.unwrap();
            if acquired.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        acquired.expect("lock should be free after the handle is dropped")
            .release()
            .await
            .unwrap();
    }

    /// Content tables in a throwaway schema.
    struct ScratchSchema {
        admin: sqlx::PgPool,
        pool: sqlx::PgPool,
        name: String,
    }

    impl ScratchSchema {
        async fn create(url: &str) -> Self {
            use std::str::FromStr;

            use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

            let name = format!("tribute_test_{}", Uuid::now_v7().simple());
            let admin = crate::db::connect(url, 2).await.unwrap();
            sqlx::query(&format!("CREATE SCHEMA {name}"))
                .execute(&admin)
                .await
                .unwrap();

            let options = PgConnectOptions::from_str(url)
                .unwrap()
                .options([("search_path", name.as_str())]);
            let pool = PgPoolOptions::new()
                .max_connections(4)
                .connect_with(options)
                .await
                .unwrap();

            for ddl in [
                "CREATE TABLE memorial (id UUID PRIMARY KEY, status TEXT NOT NULL, premium_slug TEXT, updated_at TIMESTAMPTZ NOT NULL)",
                "CREATE TABLE memory (id UUID PRIMARY KEY, status TEXT NOT NULL, asset_path TEXT, updated_at TIMESTAMPTZ NOT NULL)",
                "CREATE TABLE condolence (id UUID PRIMARY KEY, status TEXT NOT NULL, updated_at TIMESTAMPTZ NOT NULL)",
            ] {
                sqlx::query(ddl).execute(&pool).await.unwrap();
            }

            Self { admin, pool, name }
        }

        async fn insert_memorial(&self, status: ContentStatus, slug: &str, updated_at: DateTime<Utc>) -> Uuid {
            let id = Uuid::now_v7();
            sqlx::query("INSERT INTO memorial (id, status, premium_slug, updated_at) VALUES ($1, $2, $3, $4)")
                .bind(id)
                .bind(status.as_str())
                .bind(slug)
                .bind(updated_at)
                .execute(&self.pool)
                .await
                .unwrap();
            id
        }

        async fn insert_memory(&self, asset: Option<&str>, updated_at: DateTime<Utc>) -> Uuid {
            let id = Uuid::now_v7();
            sqlx::query("INSERT INTO memory (id, status, asset_path, updated_at) VALUES ($1, $2, $3, $4)")
                .bind(id)
                .bind(ContentStatus::Draft.as_str())
                .bind(asset)
                .bind(updated_at)
                .execute(&self.pool)
                .await
                .unwrap();
            id
        }

        async fn slug(&self, id: Uuid) -> Option<String> {
            sqlx::query_scalar("SELECT premium_slug FROM memorial WHERE id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .unwrap()
        }

        async fn memory_count(&self) -> i64 {
            sqlx::query_scalar("SELECT COUNT(*) FROM memory")
                .fetch_one(&self.pool)
                .await
                .unwrap()
        }

        async fn drop_schema(self) {
            self.pool.close().await;
            sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.name))
                .execute(&self.admin)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn postgres_reservation_release_clears_only_stale_slugs() {
        let Some(url) = test_database_url() else {
            return;
        };
        let db = ScratchSchema::create(&url).await;
        let now = Utc::now();
        let stale_a = db.insert_memorial(ContentStatus::Draft, "a", now - Duration::hours(25)).await;
        let stale_b = db.insert_memorial(ContentStatus::InReview, "b", now - Duration::hours(72)).await;
        let fresh = db.insert_memorial(ContentStatus::Draft, "c", now - Duration::hours(1)).await;
        let published = db.insert_memorial(ContentStatus::Published, "d", now - Duration::days(9)).await;

        let job = ReleaseExpiredReservations::new(Arc::new(PostgresContentStore::new(db.pool.clone())));
        let outcome = job
            .run(&JobContext { task: TaskCode::ReleaseReservedUrls, now })
            .await
            .unwrap();

        assert_eq!(outcome.rows_affected, 2);
        assert_eq!(db.slug(stale_a).await, None);
        assert_eq!(db.slug(stale_b).await, None);
        assert_eq!(db.slug(fresh).await.as_deref(), Some("c"));
        assert_eq!(db.slug(published).await.as_deref(), Some("d"));
        db.drop_schema().await;
    }

    #[tokio::test]
    async fn postgres_memory_purge_deletes_asset_then_rows() {
        let Some(url) = test_database_url() else {
            return;
        };
        let db = ScratchSchema::create(&url).await;
        let now = Utc::now();
        db.insert_memory(Some("memories/1.jpg"), now - Duration::days(20)).await;
        db.insert_memory(None, now - Duration::days(20)).await;
        let assets = InMemoryObjectStore::new();
        assets.put("memories/1.jpg");

        let job = PurgeStaleMemories::new(
            Arc::new(PostgresContentStore::new(db.pool.clone())),
            Arc::new(assets.clone()),
        );
        let outcome = job
            .run(&JobContext { task: TaskCode::PurgeMemories, now })
            .await
            .unwrap();

        assert_eq!(outcome.rows_affected, 2);
        assert_eq!(assets.delete_calls(), vec!["memories/1.jpg".to_string()]);
        assert_eq!(db.memory_count().await, 0);
        db.drop_schema().await;
    }

    #[tokio::test]
    async fn postgres_delete_memory_keeps_rows_published_since_selection() {
        let Some(url) = test_database_url() else {
            return;
        };
        let db = ScratchSchema::create(&url).await;
        let store = PostgresContentStore::new(db.pool.clone());
        let now = Utc::now();
        let cutoff = now - Duration::days(15);
        let id = db.insert_memory(None, now - Duration::days(20)).await;

        let selected = store.stale_memories(cutoff).await.unwrap();
        assert_eq!(selected.len(), 1);

        sqlx::query("UPDATE memory SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(ContentStatus::Published.as_str())
            .bind(now)
            .bind(id)
            .execute(&db.pool)
            .await
            .unwrap();

        assert!(!store.delete_memory(id, cutoff).await.unwrap());
        assert_eq!(db.memory_count().await, 1);
        db.drop_schema().await;
    }
}
