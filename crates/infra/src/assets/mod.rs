//! Binary asset storage.
//!
//! Cleanup only ever deletes assets. Deletes are idempotent: removing a path
//! that does not exist is not an error.

pub mod in_memory;
pub mod local;

pub use in_memory::InMemoryObjectStore;
pub use local::LocalObjectStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid asset path: {0}")]
    InvalidPath(String),

    #[error("asset storage io error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("asset storage error: {0}")]
    Storage(String),
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Delete the object at `path`. Absent objects are treated as deleted.
    async fn delete(&self, path: &str) -> Result<(), AssetError>;
}
