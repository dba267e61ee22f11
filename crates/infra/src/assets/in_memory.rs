use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::{AssetError, ObjectStore};

/// In-memory object store for tests/dev.
///
/// Records every delete call, and can be told to fail deletes for specific
/// paths to exercise per-record failure handling.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    inner: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    objects: HashSet<String>,
    deletes: Vec<String>,
    failing: HashSet<String>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: impl Into<String>) {
        if let Ok(mut s) = self.inner.lock() {
            s.objects.insert(path.into());
        }
    }

    pub fn fail_deletes_for(&self, path: impl Into<String>) {
        if let Ok(mut s) = self.inner.lock() {
            s.failing.insert(path.into());
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner
            .lock()
            .map(|s| s.objects.contains(path))
            .unwrap_or(false)
    }

    /// Paths passed to `delete`, in call order.
    pub fn delete_calls(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|s| s.deletes.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn delete(&self, path: &str) -> Result<(), AssetError> {
        let mut s = self
            .inner
            .lock()
            .map_err(|_| AssetError::Storage("object table poisoned".to_string()))?;

        s.deletes.push(path.to_string());
        if s.failing.contains(path) {
            return Err(AssetError::Storage(format!("injected failure for {path}")));
        }
        s.objects.remove(path);
        Ok(())
    }
}
