//! Relational content the cleanup jobs operate on.
//!
//! Only the narrow slice the maintenance jobs need is modelled here: memorial
//! slug reservations, memories (with an optional stored asset) and
//! condolences. "Stale" always means not published and last updated before a
//! cutoff computed by the caller.

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryContentStore, StoredCondolence, StoredMemorial, StoredMemory};
pub use postgres::PostgresContentStore;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Content store error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("content storage error: {0}")]
    Storage(String),
}

/// A stale memory selected for purging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleMemory {
    pub id: Uuid,
    pub asset_path: Option<String>,
}

#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Clear `premium_slug` on unpublished memorials last updated before
    /// `cutoff`. Returns the number of memorials updated.
    async fn release_stale_reservations(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Unpublished memories last updated before `cutoff`.
    async fn stale_memories(&self, cutoff: DateTime<Utc>) -> Result<Vec<StaleMemory>, StoreError>;

    /// Delete one memory if it is still unpublished and last updated before
    /// `cutoff`. Returns `false` if it is gone or no longer stale.
    async fn delete_memory(&self, id: Uuid, cutoff: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Delete unpublished condolences last updated before `cutoff`.
    async fn delete_stale_condolences(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}
