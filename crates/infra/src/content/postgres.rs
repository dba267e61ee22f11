//! Postgres-backed content store.
//!
//! Statuses are stored as their kebab-case text (`published`, `in-review`,
//! ...). Cutoffs are bound from the caller's reference time rather than
//! `NOW()` so a job run uses a single consistent instant.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use tribute_core::ContentStatus;

use super::{ContentStore, StaleMemory, StoreError};
use crate::db::describe_sqlx_error;

#[derive(Debug, Clone)]
pub struct PostgresContentStore {
    pool: PgPool,
}

impl PostgresContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage(operation: &str, err: sqlx::Error) -> StoreError {
    StoreError::Storage(describe_sqlx_error(operation, &err))
}

const PUBLISHED: &str = ContentStatus::Published.as_str();

#[async_trait::async_trait]
impl ContentStore for PostgresContentStore {
    #[instrument(skip(self), err)]
    async fn release_stale_reservations(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE memorial
            SET premium_slug = NULL
            WHERE status <> $1
                AND premium_slug IS NOT NULL
                AND updated_at < $2
            "#,
        )
        .bind(PUBLISHED)
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| storage("release_stale_reservations", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn stale_memories(&self, cutoff: DateTime<Utc>) -> Result<Vec<StaleMemory>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, asset_path
            FROM memory
            WHERE status <> $1
                AND updated_at < $2
            ORDER BY updated_at ASC
            "#,
        )
        .bind(PUBLISHED)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("stale_memories", e))?;

        rows.iter()
            .map(|row| {
                Ok(StaleMemory {
                    id: row.try_get::<Uuid, _>("id").map_err(|e| storage("stale_memories", e))?,
                    asset_path: row
                        .try_get::<Option<String>, _>("asset_path")
                        .map_err(|e| storage("stale_memories", e))?,
                })
            })
            .collect()
    }

    async fn delete_memory(&self, id: Uuid, cutoff: DateTime<Utc>) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM memory
            WHERE id = $1
                AND status <> $2
                AND updated_at < $3
            "#,
        )
        .bind(id)
        .bind(PUBLISHED)
        .bind(cutoff)
        .execute(&self.pool)
            .await
            .map_err(|e| storage("delete_memory", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete_stale_condolences(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM condolence
            WHERE status <> $1
                AND updated_at < $2
            "#,
        )
        .bind(PUBLISHED)
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| storage("delete_stale_condolences", e))?;

        Ok(result.rows_affected())
    }
}
