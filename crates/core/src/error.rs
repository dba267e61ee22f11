//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Parsing failures of domain primitives. Storage and
/// scheduling failures belong to the infrastructure error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A task name or slug did not match any known cleanup task.
    #[error("unknown cleanup task: {0}")]
    UnknownTask(String),

    /// A content status string was not recognised.
    #[error("unknown content status: {0}")]
    UnknownStatus(String),
}

impl DomainError {
    pub fn unknown_task(name: impl Into<String>) -> Self {
        Self::UnknownTask(name.into())
    }
}
