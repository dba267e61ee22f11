use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tribute_core::TaskCode;

use super::{HeldLock, LockCoordinator, LockError, LockHandle};

/// In-memory lock coordinator for tests/dev.
///
/// Clones share the same claim table, so two clones behave like two instances
/// connected to one lock store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLockCoordinator {
    held: Arc<Mutex<HashSet<i64>>>,
}

impl InMemoryLockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, task: TaskCode) -> bool {
        self.held
            .lock()
            .map(|held| held.contains(&task.lock_id()))
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl LockCoordinator for InMemoryLockCoordinator {
    async fn try_acquire(&self, task: TaskCode) -> Result<Option<LockHandle>, LockError> {
        let key = task.lock_id();
        let mut held = self
            .held
            .lock()
            .map_err(|_| LockError::Unavailable("lock table poisoned".to_string()))?;

        if !held.insert(key) {
            return Ok(None);
        }

        let claim = InMemoryClaim {
            held: self.held.clone(),
            key,
        };
        Ok(Some(LockHandle::new(task, Box::new(claim))))
    }
}

#[derive(Debug)]
struct InMemoryClaim {
    held: Arc<Mutex<HashSet<i64>>>,
    key: i64,
}

#[async_trait::async_trait]
impl HeldLock for InMemoryClaim {
    async fn unlock(self: Box<Self>, _task: TaskCode) -> Result<(), LockError> {
        // Drop does the work.
        Ok(())
    }
}

impl Drop for InMemoryClaim {
    fn drop(&mut self) {
        if let Ok(mut held) = self.held.lock() {
            held.remove(&self.key);
        }
    }
}
