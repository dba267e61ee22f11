//! Cross-instance advisory locks.
//!
//! A lock coordinator offers a single capability: a non-blocking, named,
//! exclusive claim keyed by a [`TaskCode`]'s lock id and visible to every
//! instance connected to the same backing store.
//!
//! ## Guaranteed release
//!
//! A successful acquisition yields a [`LockHandle`]. Callers release it with
//! [`LockHandle::release`], which consumes the handle. If a handle is dropped
//! without being released (a panicking job, a cancelled future) the adapter's
//! own drop path frees the claim, so a lock can never outlive its holder.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryLockCoordinator;
pub use postgres::PostgresLockCoordinator;

use thiserror::Error;
use tracing::warn;

use tribute_core::TaskCode;

/// Lock coordinator error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LockError {
    /// The backing store could not be reached or rejected the request.
    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}

/// Non-blocking named exclusive claims shared by all instances.
#[async_trait::async_trait]
pub trait LockCoordinator: Send + Sync {
    /// Try to claim `task` without waiting.
    ///
    /// Returns `Ok(Some(handle))` iff this call obtained the claim and
    /// `Ok(None)` immediately when another holder has it.
    async fn try_acquire(&self, task: TaskCode) -> Result<Option<LockHandle>, LockError>;
}

/// Adapter-specific state of a held claim.
#[async_trait::async_trait]
pub trait HeldLock: Send {
    /// Release the claim. Called at most once, through [`LockHandle::release`].
    async fn unlock(self: Box<Self>, task: TaskCode) -> Result<(), LockError>;
}

/// A claim held by this process on one task.
pub struct LockHandle {
    task: TaskCode,
    held: Option<Box<dyn HeldLock>>,
}

impl LockHandle {
    pub fn new(task: TaskCode, held: Box<dyn HeldLock>) -> Self {
        Self {
            task,
            held: Some(held),
        }
    }

    /// Release the claim.
    pub async fn release(mut self) -> Result<(), LockError> {
        match self.held.take() {
            Some(held) => held.unlock(self.task).await,
            None => Ok(()),
        }
    }
}

impl core::fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LockHandle")
            .field("task", &self.task)
            .field("held", &self.held.is_some())
            .finish()
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if self.held.take().is_some() {
            warn!(
                job = self.task.job_name(),
                task_code = self.task.lock_id(),
                "lock handle dropped without release; freeing claim on drop"
            );
        }
    }
}
