use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tribute_core::ContentStatus;

use super::{ContentStore, StaleMemory, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMemorial {
    pub id: Uuid,
    pub status: ContentStatus,
    pub premium_slug: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMemory {
    pub id: Uuid,
    pub status: ContentStatus,
    pub asset_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCondolence {
    pub id: Uuid,
    pub status: ContentStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    memorials: Vec<StoredMemorial>,
    memories: Vec<StoredMemory>,
    condolences: Vec<StoredCondolence>,
}

/// In-memory content tables for tests/dev.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentStore {
    tables: Arc<RwLock<Tables>>,
}

fn poisoned() -> StoreError {
    StoreError::Storage("content tables poisoned".to_string())
}

fn is_stale(status: ContentStatus, updated_at: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
    !status.is_published() && updated_at < cutoff
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_memorial(&self, memorial: StoredMemorial) {
        if let Ok(mut t) = self.tables.write() {
            t.memorials.push(memorial);
        }
    }

    pub fn insert_memory(&self, memory: StoredMemory) {
        if let Ok(mut t) = self.tables.write() {
            t.memories.push(memory);
        }
    }

    pub fn insert_condolence(&self, condolence: StoredCondolence) {
        if let Ok(mut t) = self.tables.write() {
            t.condolences.push(condolence);
        }
    }

    /// Change a memory's status as an editor would, bumping `updated_at`.
    pub fn update_memory(&self, id: Uuid, status: ContentStatus, updated_at: DateTime<Utc>) {
        if let Ok(mut t) = self.tables.write() {
            if let Some(memory) = t.memories.iter_mut().find(|m| m.id == id) {
                memory.status = status;
                memory.updated_at = updated_at;
            }
        }
    }

    pub fn memorial(&self, id: Uuid) -> Option<StoredMemorial> {
        let t = self.tables.read().ok()?;
        t.memorials.iter().find(|m| m.id == id).cloned()
    }

    pub fn memory_ids(&self) -> Vec<Uuid> {
        self.tables
            .read()
            .map(|t| t.memories.iter().map(|m| m.id).collect())
            .unwrap_or_default()
    }

    pub fn condolence_ids(&self) -> Vec<Uuid> {
        self.tables
            .read()
            .map(|t| t.condolences.iter().map(|c| c.id).collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ContentStore for InMemoryContentStore {
    async fn release_stale_reservations(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut t = self.tables.write().map_err(|_| poisoned())?;
        let mut released = 0;
        for memorial in t.memorials.iter_mut() {
            if memorial.premium_slug.is_some() && is_stale(memorial.status, memorial.updated_at, cutoff) {
                memorial.premium_slug = None;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn stale_memories(&self, cutoff: DateTime<Utc>) -> Result<Vec<StaleMemory>, StoreError> {
        let t = self.tables.read().map_err(|_| poisoned())?;
        Ok(t.memories
            .iter()
            .filter(|m| is_stale(m.status, m.updated_at, cutoff))
            .map(|m| StaleMemory {
                id: m.id,
                asset_path: m.asset_path.clone(),
            })
            .collect())
    }

    async fn delete_memory(&self, id: Uuid, cutoff: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut t = self.tables.write().map_err(|_| poisoned())?;
        let before = t.memories.len();
        t.memories
            .retain(|m| m.id != id || !is_stale(m.status, m.updated_at, cutoff));
        Ok(t.memories.len() < before)
    }

    async fn delete_stale_condolences(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut t = self.tables.write().map_err(|_| poisoned())?;
        let before = t.condolences.len();
        t.condolences
            .retain(|c| !is_stale(c.status, c.updated_at, cutoff));
        Ok((before - t.condolences.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn published_rows_are_never_stale() {
        let store = InMemoryContentStore::new();
        let now = Utc::now();
        let old = now - Duration::days(30);

        store.insert_condolence(StoredCondolence {
            id: Uuid::now_v7(),
            status: ContentStatus::Published,
            updated_at: old,
        });
        store.insert_condolence(StoredCondolence {
            id: Uuid::now_v7(),
            status: ContentStatus::Rejected,
            updated_at: old,
        });

        let deleted = store.delete_stale_condolences(now - Duration::days(15)).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.condolence_ids().len(), 1);
    }

    #[tokio::test]
    async fn delete_memory_reports_missing_rows() {
        let store = InMemoryContentStore::new();
        let now = Utc::now();
        let cutoff = now - Duration::days(15);
        let id = Uuid::now_v7();
        store.insert_memory(StoredMemory {
            id,
            status: ContentStatus::Draft,
            asset_path: None,
            updated_at: now - Duration::days(20),
        });

        assert!(store.delete_memory(id, cutoff).await.unwrap());
        assert!(!store.delete_memory(id, cutoff).await.unwrap());
    }

    #[tokio::test]
    async fn delete_memory_keeps_rows_that_are_no_longer_stale() {
        let store = InMemoryContentStore::new();
        let now = Utc::now();
        let cutoff = now - Duration::days(15);
        let published = Uuid::now_v7();
        let edited = Uuid::now_v7();
        for id in [published, edited] {
            store.insert_memory(StoredMemory {
                id,
                status: ContentStatus::Draft,
                asset_path: None,
                updated_at: now - Duration::days(20),
            });
        }
        store.update_memory(published, ContentStatus::Published, now - Duration::days(20));
        store.update_memory(edited, ContentStatus::Draft, now);

        assert!(!store.delete_memory(published, cutoff).await.unwrap());
        assert!(!store.delete_memory(edited, cutoff).await.unwrap());
        assert_eq!(store.memory_ids(), vec![published, edited]);
    }
}
