//! Postgres session-level advisory locks.
//!
//! `pg_try_advisory_lock` claims are owned by the database session that took
//! them, so a held claim pins one pooled connection until it is released.
//! Unlocking must happen on that same connection.
//!
//! If a claim is dropped without an explicit unlock, the connection is closed
//! instead of being returned to the pool. Postgres releases every session lock
//! when the session ends, so the claim cannot leak into a recycled connection.

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tracing::{instrument, warn};

use tribute_core::TaskCode;

use super::{HeldLock, LockCoordinator, LockError, LockHandle};
use crate::db::describe_sqlx_error;

/// Postgres-backed advisory lock coordinator.
#[derive(Debug, Clone)]
pub struct PostgresLockCoordinator {
    pool: PgPool,
}

impl PostgresLockCoordinator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LockCoordinator for PostgresLockCoordinator {
    #[instrument(skip(self), fields(job = task.job_name(), task_code = task.lock_id()), err)]
    async fn try_acquire(&self, task: TaskCode) -> Result<Option<LockHandle>, LockError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| LockError::Unavailable(describe_sqlx_error("try_acquire", &e)))?;

        let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
            .bind(task.lock_id())
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| LockError::Unavailable(describe_sqlx_error("try_acquire", &e)))?;

        if !locked {
            return Ok(None);
        }

        Ok(Some(LockHandle::new(
            task,
            Box::new(SessionLock { conn: Some(conn) }),
        )))
    }
}

struct SessionLock {
    conn: Option<PoolConnection<Postgres>>,
}

#[async_trait::async_trait]
impl HeldLock for SessionLock {
    async fn unlock(mut self: Box<Self>, task: TaskCode) -> Result<(), LockError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };

        let result: Result<bool, sqlx::Error> = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
            .bind(task.lock_id())
            .fetch_one(&mut *conn)
            .await;

        match result {
            Ok(true) => Ok(()),
            Ok(false) => {
                // The session no longer owned the claim; do not hand it back to the pool.
                conn.close_on_drop();
                warn!(
                    job = task.job_name(),
                    task_code = task.lock_id(),
                    "advisory lock was not held by this session at release"
                );
                Ok(())
            }
            Err(e) => {
                conn.close_on_drop();
                Err(LockError::Unavailable(describe_sqlx_error("release", &e)))
            }
        }
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.as_mut() {
            conn.close_on_drop();
        }
    }
}
